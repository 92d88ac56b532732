//! Background session clean-up.
//!
//! Short-term memory never expires on its own. Deletion is an explicit
//! request handed to a worker task, optionally fed by an idle sweep over the
//! advisory last-access telemetry.

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use log::{debug, info, warn};
use mnemo_rs_memory::ShortTermStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CLEANUP_QUEUE_BUFFER: usize = 256;

/// Queue of session deletions processed by a background worker.
#[derive(Debug)]
pub struct SessionCleaner {
    store: ShortTermStore,
    sender: mpsc::Sender<String>,
    worker: JoinHandle<usize>,
}

impl SessionCleaner {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(store: ShortTermStore) -> Self {
        let (sender, mut receiver) = mpsc::channel::<String>(CLEANUP_QUEUE_BUFFER);
        let worker_store = store.clone();
        let worker = tokio::spawn(async move {
            let mut cleared = 0;
            while let Some(session_id) = receiver.recv().await {
                match worker_store.clear_session(&session_id).await {
                    Ok(()) => cleared += 1,
                    Err(err) => warn!(
                        "session clean-up failed (session_id={}, err={})",
                        session_id, err
                    ),
                }
            }
            debug!("session cleaner stopped (cleared={})", cleared);
            cleared
        });
        Self {
            store,
            sender,
            worker,
        }
    }

    /// Queue a session for deletion. Returns false once the worker has stopped.
    pub async fn request_clear(&self, session_id: impl Into<String>) -> bool {
        let session_id = session_id.into();
        debug!("queueing session clean-up (session_id={})", session_id);
        if self.sender.send(session_id).await.is_err() {
            warn!("session cleaner is not running");
            return false;
        }
        true
    }

    /// Queue every listed session whose known last access is older than `max_idle`.
    ///
    /// Sessions with no readable access time have age zero and are never
    /// queued. Returns the queued session ids.
    pub async fn sweep_idle(
        &self,
        session_ids: &[String],
        max_idle: Duration,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let lookups = session_ids.iter().map(|session_id| async move {
            match self.store.get_access_time(session_id).await {
                Ok(Some(at)) if now - at > max_idle => Some(session_id.clone()),
                Ok(_) => None,
                Err(err) => {
                    warn!(
                        "idle sweep could not read access time (session_id={}, err={})",
                        session_id, err
                    );
                    None
                }
            }
        });
        let idle: Vec<String> = join_all(lookups).await.into_iter().flatten().collect();
        let mut queued = Vec::with_capacity(idle.len());
        for session_id in idle {
            if !self.request_clear(session_id.clone()).await {
                break;
            }
            queued.push(session_id);
        }
        info!(
            "idle sweep finished (checked={}, queued={})",
            session_ids.len(),
            queued.len()
        );
        queued
    }

    /// Stop accepting requests, drain the queue and return how many sessions were cleared.
    pub async fn shutdown(self) -> usize {
        drop(self.sender);
        match self.worker.await {
            Ok(cleared) => cleared,
            Err(err) => {
                warn!("session cleaner worker failed (err={})", err);
                0
            }
        }
    }
}

//! Per-session conversation log with a bounded recent window and a cached summary.

use crate::backend::KeyValueBackend;
use crate::error::MemoryError;
use crate::model::{AgedHistory, Message, Role, SessionContext, Summary};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

/// Short-term memory over a key-value backend.
///
/// Each session owns three keys: an append-only message list, the cached
/// summary, and the last access time in unix seconds. The store never decides
/// when to summarize and never expires sessions on its own.
#[derive(Clone)]
pub struct ShortTermStore {
    backend: Arc<dyn KeyValueBackend>,
    window_size: usize,
}

impl std::fmt::Debug for ShortTermStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortTermStore")
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

fn messages_key(session_id: &str) -> String {
    format!("session:{session_id}:messages")
}

fn summary_key(session_id: &str) -> String {
    format!("session:{session_id}:summary")
}

fn last_access_key(session_id: &str) -> String {
    format!("session:{session_id}:last_access")
}

impl ShortTermStore {
    /// Create a store keeping `window_size` recent rounds verbatim.
    pub fn new(backend: Arc<dyn KeyValueBackend>, window_size: usize) -> Self {
        Self {
            backend,
            window_size,
        }
    }

    /// Number of rounds kept verbatim.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Check the backend is reachable.
    pub async fn ping(&self) -> Result<(), MemoryError> {
        self.backend.ping().await
    }

    /// Append one message to the session log.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Message, MemoryError> {
        let message = Message::now(role, content);
        let payload = serde_json::to_vec(&message)?;
        let len = self
            .backend
            .push(&messages_key(session_id), payload)
            .await?;
        debug!(
            "appended message (session_id={}, role={}, log_len={})",
            session_id, role, len
        );
        Ok(message)
    }

    /// Read every parseable message in the log, oldest first.
    async fn load_messages(&self, session_id: &str) -> Result<Vec<Message>, MemoryError> {
        let raw = self.backend.range(&messages_key(session_id), 0, -1).await?;
        let mut messages = Vec::with_capacity(raw.len());
        for (position, item) in raw.into_iter().enumerate() {
            match serde_json::from_slice::<Message>(&item) {
                Ok(message) => messages.push(message),
                Err(err) => warn!(
                    "skipping unparseable message (session_id={}, position={}, err={})",
                    session_id, position, err
                ),
            }
        }
        Ok(messages)
    }

    /// Index of the first message inside the retained window.
    fn window_start(&self, message_count: usize) -> usize {
        let total_rounds = message_count / 2;
        if total_rounds <= self.window_size {
            0
        } else {
            2 * (total_rounds - self.window_size)
        }
    }

    /// Recent window plus cached summary for a session.
    ///
    /// Unknown sessions return an empty context. The summary is only
    /// returned once the log holds more rounds than the window.
    pub async fn get_context(&self, session_id: &str) -> Result<SessionContext, MemoryError> {
        let messages = self.load_messages(session_id).await?;
        if messages.is_empty() {
            return Ok(SessionContext::empty(self.window_size));
        }
        let total_rounds = messages.len() / 2;
        let start = self.window_start(messages.len());
        let summary = if total_rounds > self.window_size {
            self.summary(session_id).await?
        } else {
            None
        };
        Ok(SessionContext {
            recent: messages[start..].to_vec(),
            summary,
            total_rounds,
            window_size: self.window_size,
        })
    }

    /// Rounds that fall outside the retained window, from a single log read.
    pub async fn aged_history(&self, session_id: &str) -> Result<AgedHistory, MemoryError> {
        let mut messages = self.load_messages(session_id).await?;
        let total_rounds = messages.len() / 2;
        let start = self.window_start(messages.len());
        messages.truncate(start);
        Ok(AgedHistory {
            messages,
            total_rounds,
        })
    }

    /// Cached summary, if any.
    pub async fn summary(&self, session_id: &str) -> Result<Option<Summary>, MemoryError> {
        let Some(raw) = self.backend.get(&summary_key(session_id)).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Summary>(&raw) {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                let text = String::from_utf8_lossy(&raw).into_owned();
                warn!(
                    "summary is not structured, treating as plain text (session_id={}, err={})",
                    session_id, err
                );
                Ok(Some(Summary::new(text, 0, 0)))
            }
        }
    }

    /// Replace the cached summary.
    pub async fn save_summary(
        &self,
        session_id: &str,
        summary: &Summary,
    ) -> Result<(), MemoryError> {
        let payload = serde_json::to_vec(summary)?;
        self.backend.set(&summary_key(session_id), payload).await?;
        debug!(
            "saved summary (session_id={}, covered_rounds={}, text_len={})",
            session_id,
            summary.covered_rounds,
            summary.text.len()
        );
        Ok(())
    }

    /// Remove the log, summary and access time in one step. Idempotent.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), MemoryError> {
        let keys = [
            messages_key(session_id),
            summary_key(session_id),
            last_access_key(session_id),
        ];
        let removed = self.backend.delete(&keys).await?;
        info!(
            "cleared session (session_id={}, keys_removed={})",
            session_id, removed
        );
        Ok(())
    }

    /// Record the current time as the session's last access.
    pub async fn touch_access_time(&self, session_id: &str) -> Result<(), MemoryError> {
        self.touch_access_time_at(session_id, Utc::now()).await
    }

    /// Record an explicit last access time.
    pub async fn touch_access_time_at(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), MemoryError> {
        self.backend
            .set(
                &last_access_key(session_id),
                at.timestamp().to_string().into_bytes(),
            )
            .await
    }

    /// Last recorded access time, if known and readable.
    pub async fn get_access_time(
        &self,
        session_id: &str,
    ) -> Result<Option<DateTime<Utc>>, MemoryError> {
        let Some(raw) = self.backend.get(&last_access_key(session_id)).await? else {
            return Ok(None);
        };
        let parsed = std::str::from_utf8(&raw)
            .ok()
            .and_then(|text| text.trim().parse::<i64>().ok())
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single());
        if parsed.is_none() {
            warn!("unreadable access time (session_id={})", session_id);
        }
        Ok(parsed)
    }

    /// Time since last access. Zero when the access time is unknown.
    pub async fn session_age(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Duration, MemoryError> {
        Ok(self
            .get_access_time(session_id)
            .await?
            .map(|at| (now - at).max(Duration::zero()))
            .unwrap_or_else(Duration::zero))
    }
}

#[cfg(test)]
mod tests {
    use super::{ShortTermStore, messages_key, summary_key};
    use crate::backend::{InMemoryKeyValue, KeyValueBackend};
    use crate::model::{Role, Summary};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn seed_rounds(
        store: &ShortTermStore,
        session: &str,
        rounds: std::ops::RangeInclusive<usize>,
    ) {
        for round in rounds {
            store
                .append_message(session, Role::User, format!("u{round}"))
                .await
                .expect("append user");
            store
                .append_message(session, Role::Assistant, format!("a{round}"))
                .await
                .expect("append assistant");
        }
    }

    fn contents(messages: &[crate::model::Message]) -> Vec<String> {
        messages.iter().map(|message| message.content.clone()).collect()
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let store = ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 3);
        let context = store.get_context("nobody").await.expect("context");
        assert!(context.recent.is_empty());
        assert_eq!(context.summary, None);
        assert_eq!(context.total_rounds, 0);
    }

    #[tokio::test]
    async fn window_keeps_last_rounds_and_exposes_summary() {
        let store = ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 2);
        seed_rounds(&store, "s", 1..=2).await;
        store
            .save_summary("s", &Summary::new("early", 2, 0))
            .await
            .expect("save");
        let context = store.get_context("s").await.expect("context");
        assert_eq!(contents(&context.recent), vec!["u1", "a1", "u2", "a2"]);
        assert_eq!(context.summary, None);

        seed_rounds(&store, "s", 3..=5).await;
        let context = store.get_context("s").await.expect("context");
        assert_eq!(context.total_rounds, 5);
        assert_eq!(contents(&context.recent), vec!["u4", "a4", "u5", "a5"]);
        assert_eq!(context.summary_text(), Some("early"));

        let aged = store.aged_history("s").await.expect("aged");
        assert_eq!(aged.messages.len(), 6);
        assert_eq!(aged.rounds(), 3);
        assert_eq!(aged.total_rounds, 5);
    }

    #[tokio::test]
    async fn odd_length_log_keeps_dangling_message() {
        let store = ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 1);
        seed_rounds(&store, "s", 1..=2).await;
        store
            .append_message("s", Role::User, "dangling")
            .await
            .expect("append");
        let context = store.get_context("s").await.expect("context");
        assert_eq!(context.total_rounds, 2);
        assert_eq!(contents(&context.recent), vec!["u2", "a2", "dangling"]);
    }

    #[tokio::test]
    async fn unparseable_entries_are_skipped() {
        let backend = Arc::new(InMemoryKeyValue::new());
        let store = ShortTermStore::new(backend.clone(), 5);
        seed_rounds(&store, "s", 1..=1).await;
        backend
            .push(&messages_key("s"), b"not json".to_vec())
            .await
            .expect("push");
        let context = store.get_context("s").await.expect("context");
        assert_eq!(contents(&context.recent), vec!["u1", "a1"]);
    }

    #[tokio::test]
    async fn plain_text_summary_is_accepted() {
        let backend = Arc::new(InMemoryKeyValue::new());
        let store = ShortTermStore::new(backend.clone(), 5);
        backend
            .set(&summary_key("s"), "legacy summary".as_bytes().to_vec())
            .await
            .expect("set");
        let summary = store.summary("s").await.expect("summary").expect("present");
        assert_eq!(summary.text, "legacy summary");
        assert_eq!(summary.covered_rounds, 0);
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_removes_everything() {
        let backend = Arc::new(InMemoryKeyValue::new());
        let store = ShortTermStore::new(backend.clone(), 2);
        seed_rounds(&store, "s", 1..=3).await;
        store
            .save_summary("s", &Summary::new("x", 3, 1))
            .await
            .expect("save");
        store.touch_access_time("s").await.expect("touch");

        store.clear_session("s").await.expect("clear");
        store.clear_session("s").await.expect("clear again");
        assert_eq!(backend.key_count(), 0);
        assert_eq!(store.get_access_time("s").await.expect("access"), None);
        assert!(store.get_context("s").await.expect("context").recent.is_empty());
    }

    #[tokio::test]
    async fn session_age_uses_recorded_access_time() {
        let store = ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 2);
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("time");
        assert_eq!(
            store.session_age("s", now).await.expect("age"),
            Duration::zero()
        );

        store
            .touch_access_time_at("s", now - Duration::hours(2))
            .await
            .expect("touch");
        assert_eq!(
            store.session_age("s", now).await.expect("age"),
            Duration::hours(2)
        );
    }
}

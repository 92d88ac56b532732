//! Optional per-session turn serialization.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// One async mutex per session id, created on demand.
///
/// Holding the guard for the whole turn gives one in-flight turn per session.
/// Different sessions never contend.
#[derive(Debug, Default, Clone)]
pub(crate) struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    pub(crate) async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // Entries only the map still references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionLocks;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_waits_for_release() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1").await;
        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.acquire("s1")).await;
        assert!(waiting.is_err());
        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire("s2")).await;
        assert!(other.is_ok());
        drop(other);
        drop(guard);
        let _again = locks.acquire("s1").await;
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = SessionLocks::new();
        drop(locks.acquire("a").await);
        drop(locks.acquire("b").await);
        let _held = locks.acquire("c").await;
        assert_eq!(locks.tracked(), 1);
    }
}

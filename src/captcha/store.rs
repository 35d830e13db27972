use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// A pending human-verification challenge. The expected answer never leaves
/// the server.
#[derive(Debug, Clone, Copy)]
pub struct Challenge {
    pub answer: i64,
    pub expires_at: OffsetDateTime,
}

/// Key-value store with TTL semantics backing the captcha subsystem.
///
/// The in-process map is enough for a single instance; a multi-instance
/// deployment would swap in an external cache behind the same trait. There
/// is no durability requirement: dropping all pending challenges on restart
/// is acceptable.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn insert(&self, id: Uuid, challenge: Challenge);

    /// Removes and returns the entry in one step. Of any concurrent callers
    /// with the same id, exactly one observes the entry; the rest get None.
    async fn take(&self, id: Uuid) -> Option<Challenge>;

    /// Drops entries whose expiry has passed, returning how many were
    /// removed. Bounds memory only; `take` already filters on expiry.
    async fn sweep(&self) -> usize;
}

pub struct MemoryChallengeStore {
    entries: Mutex<HashMap<Uuid, Challenge>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn insert(&self, id: Uuid, challenge: Challenge) {
        self.entries.lock().expect("captcha store poisoned").insert(id, challenge);
    }

    async fn take(&self, id: Uuid) -> Option<Challenge> {
        self.entries.lock().expect("captcha store poisoned").remove(&id)
    }

    async fn sweep(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().expect("captcha store poisoned");
        let before = entries.len();
        entries.retain(|_, c| c.expires_at > now);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn challenge(offset_secs: i64) -> Challenge {
        Challenge {
            answer: 12,
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn take_is_get_and_delete() {
        let store = MemoryChallengeStore::new();
        let id = Uuid::new_v4();
        store.insert(id, challenge(300)).await;

        let first = store.take(id).await;
        assert!(first.is_some());
        assert!(store.take(id).await.is_none());
    }

    #[tokio::test]
    async fn take_unknown_id_is_none() {
        let store = MemoryChallengeStore::new();
        assert!(store.take(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let store = MemoryChallengeStore::new();
        let live = Uuid::new_v4();
        let dead = Uuid::new_v4();
        store.insert(live, challenge(300)).await;
        store.insert(dead, challenge(-1)).await;

        assert_eq!(store.sweep().await, 1);
        assert!(store.take(live).await.is_some());
        assert!(store.take(dead).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_takes_have_one_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryChallengeStore::new());
        let id = Uuid::new_v4();
        store.insert(id, challenge(300)).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.take(id).await.is_some() }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.expect("task ok") {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

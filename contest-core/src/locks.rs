//! Per-contest mutual exclusion
//!
//! Every read-modify-write of a contest (intake, votes, administration) runs while
//! holding that contest's guard. Different contests never contend. An entry lives
//! only while some caller holds or waits on it.

use crate::types::ContestId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Guard held for the duration of one contest mutation
///
/// Dropping the last guard for a contest removes its entry from the registry.
#[derive(Debug)]
pub struct ContestGuard<'a> {
    locks: &'a DashMap<ContestId, Arc<Mutex<()>>>,
    contest_id: ContestId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ContestGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means the map is the only owner.
        // `remove_if` runs under the shard lock that `acquire` also takes.
        self.locks
            .remove_if(&self.contest_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Lock registry keyed by contest id
#[derive(Debug, Default)]
pub struct ContestLocks {
    locks: DashMap<ContestId, Arc<Mutex<()>>>,
}

impl ContestLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a contest
    pub async fn acquire(&self, contest_id: ContestId) -> ContestGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting
        let lock = self
            .locks
            .entry(contest_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        ContestGuard {
            locks: &self.locks,
            contest_id,
            guard: Some(guard),
        }
    }

    /// Number of contests currently held or awaited
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True if no contest is held or awaited
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_contest_is_exclusive() {
        let locks = Arc::new(ContestLocks::new());
        let id = ContestId::new();

        let guard = locks.acquire(id).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_contests_do_not_contend() {
        let locks = ContestLocks::new();

        let _first = locks.acquire(ContestId::new()).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(ContestId::new()),
        )
        .await;

        assert!(second.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_entry_removed_after_last_guard() {
        let locks = Arc::new(ContestLocks::new());
        let id = ContestId::new();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter still needs the entry
        drop(guard);
        waiter.await.unwrap();

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_registry_does_not_grow_with_distinct_contests() {
        let locks = ContestLocks::new();

        for _ in 0..1000 {
            let _guard = locks.acquire(ContestId::new()).await;
        }

        assert_eq!(locks.len(), 0);
    }
}

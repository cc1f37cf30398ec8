//! Per-aggregate serialization locks.
//!
//! The document store saves with last-writer-wins semantics and no
//! optimistic concurrency token, so two concurrent load-mutate-save cycles
//! against the same aggregate could silently lose an embedded-list append.
//! Every mutating path acquires the aggregate's lock before loading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Process-wide keyed asynchronous locks, one per aggregate id.
#[derive(Debug, Default)]
pub struct AggregateLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AggregateLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting if another operation holds it.
    ///
    /// The guard releases the lock on drop. Lock entries are retained for
    /// the process lifetime; the key space is bounded by the number of live
    /// aggregates.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn acquire(&self, key: impl Into<String>) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().unwrap();
            Arc::clone(
                table
                    .entry(key.into())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_same_key_serializes_critical_sections() {
        let locks = Arc::new(AggregateLocks::new());
        let concurrent = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let concurrent = Arc::clone(&concurrent);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("event:42").await;
                let in_flight = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(in_flight, Ordering::SeqCst);
                tokio::task::yield_now().await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let locks = AggregateLocks::new();

        let first = locks.acquire("event:1").await;
        let second = locks.acquire("event:2").await;

        drop(first);
        drop(second);
    }
}

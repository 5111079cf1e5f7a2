//! Per-key async locks
//!
//! Entries exist only while a task holds or waits on the key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct KeyedLock {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyedLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `fut` while holding the lock for `key`
    pub(crate) async fn with_lock<F, T>(&self, key: i64, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self.lock_for(key).await;
        let result = {
            let _guard = lock.lock().await;
            fut.await
        };
        self.release(key, lock).await;
        result
    }

    pub(crate) async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }

    async fn lock_for(&self, key: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release(&self, key: i64, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // map entry + ours; anyone else already cloned it and is waiting
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_runs_one_at_a_time() {
        let lock = Arc::new(KeyedLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let (lock, inside, peak) = (lock.clone(), inside.clone(), peak.clone());
            handles.push(tokio::spawn(async move {
                lock.with_lock(1, async {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(lock.is_empty().await);
    }

    #[tokio::test]
    async fn test_returns_inner_result() {
        let lock = KeyedLock::new();
        assert_eq!(lock.with_lock(7, async { 42 }).await, 42);
        assert!(lock.is_empty().await);
    }
}

//! Per-key lock registry.
//!
//! Hands out one binary async mutex per key name. Get-or-create is atomic,
//! so concurrent callers naming the same key always contend on the same
//! mutex. Acquisition waits at most `wait`; a guard whose wait ran out holds
//! nothing and releases nothing.
//!
//! Under [`LockRetention::Retain`] every key's mutex lives as long as the
//! registry. Under [`LockRetention::Reclaim`] the last guard to drop removes
//! the entry, provided no other guard or waiter still references the mutex.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::LockRetention;

type KeyMutex = Arc<Mutex<()>>;

/// Registry of per-key mutexes.
pub struct KeyLocks {
    locks: DashMap<String, KeyMutex>,
    wait: Duration,
    retention: LockRetention,
}

impl KeyLocks {
    pub fn new(wait: Duration, retention: LockRetention) -> Self {
        Self {
            locks: DashMap::new(),
            wait,
            retention,
        }
    }

    /// Upper bound on how long [`acquire`](Self::acquire) waits.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Number of keys with a registered mutex.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Lock `key`, waiting at most [`wait`](Self::wait).
    ///
    /// Always returns a guard; check [`KeyLockGuard::is_held`] to learn
    /// whether the wait succeeded.
    pub async fn acquire(&self, key: &str) -> KeyLockGuard<'_> {
        let mutex = self.mutex_for(key);
        let guard = tokio::time::timeout(self.wait, mutex.lock_owned())
            .await
            .ok();
        KeyLockGuard {
            registry: self,
            key: key.to_owned(),
            guard,
        }
    }

    fn mutex_for(&self, key: &str) -> KeyMutex {
        if let Some(existing) = self.locks.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.locks
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn reclaim(&self, key: &str) {
        // The shard write lock serialises this check against mutex_for, so
        // a count of one means only the registry still holds the mutex.
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive access to one key, released on drop.
pub struct KeyLockGuard<'a> {
    registry: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLockGuard<'_> {
    /// Whether the lock was actually obtained. `false` after a timed-out
    /// wait.
    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        // Release before reclaiming: the owned guard keeps a reference to
        // the mutex alive.
        self.guard.take();
        if self.registry.retention == LockRetention::Reclaim {
            self.registry.reclaim(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_shares_one_mutex() {
        let locks = KeyLocks::new(Duration::from_secs(1), LockRetention::Retain);
        let a = locks.mutex_for("k");
        let b = locks.mutex_for("k");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn timed_out_guard_holds_nothing() {
        let locks = KeyLocks::new(Duration::from_millis(20), LockRetention::Retain);
        let first = locks.acquire("k").await;
        assert!(first.is_held());

        let second = locks.acquire("k").await;
        assert!(!second.is_held());
        drop(second);

        // The timed-out guard must not have released the first holder's lock.
        let third = locks.acquire("k").await;
        assert!(!third.is_held());
        drop(third);

        drop(first);
        assert!(locks.acquire("k").await.is_held());
    }

    #[tokio::test]
    async fn reclaim_keeps_entry_while_referenced() {
        let locks = KeyLocks::new(Duration::from_millis(20), LockRetention::Reclaim);
        let held = locks.acquire("k").await;
        {
            let _timed_out = locks.acquire("k").await;
        }
        assert_eq!(locks.len(), 1, "holder still references the mutex");
        drop(held);
        assert!(locks.is_empty());
    }
}

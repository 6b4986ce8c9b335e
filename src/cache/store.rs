//! Time-to-live artifact store.
//!
//! A map from key to [`CacheEntry`] with a single cache-wide lifetime.
//! Expired entries read as absent on every path; they are dropped lazily by
//! moka rather than by a sweeper. There is no capacity bound.

use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::config::MAX_CACHING_DURATION;
use crate::types::Artifact;

/// A stored artifact and its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub artifact: Artifact,
    /// When the entry was inserted.
    pub cached_at: Instant,
    /// When the entry stops being served. `None` means never.
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe key → artifact store with absolute expiry.
///
/// Keys are compared exactly (case-sensitive, no normalisation).
pub struct TtlStore {
    entries: Cache<String, CacheEntry>,
    ttl: Option<Duration>,
}

impl TtlStore {
    /// Create a store. `None` means entries never expire.
    ///
    /// moka's own eviction is capped at [`MAX_CACHING_DURATION`]; longer
    /// lifetimes are still honoured by the per-entry expiry.
    pub fn new(ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder();
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl.min(MAX_CACHING_DURATION));
        }
        Self {
            entries: builder.build(),
            ttl,
        }
    }

    /// Entry lifetime, or `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Whether a live (present and unexpired) entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// The live artifact for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Artifact> {
        self.entry(key).map(|entry| entry.artifact)
    }

    /// The live entry for `key`, if any. An expired entry found here is
    /// dropped.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.is_expired_at(Instant::now()) {
            self.entries.invalidate(key);
            return None;
        }
        Some(entry)
    }

    /// Insert or overwrite the entry for `key`, stamping its expiry. An
    /// expiry past the clock's range is treated as never.
    pub fn put(&self, key: &str, artifact: Artifact) {
        let cached_at = Instant::now();
        let entry = CacheEntry {
            artifact,
            cached_at,
            expires_at: self.ttl.and_then(|ttl| cached_at.checked_add(ttl)),
        };
        self.entries.insert(key.to_owned(), entry);
    }

    /// Drop the entry for `key`. No-op when absent.
    pub fn remove(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Keys currently held. Order is not guaranteed.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| String::clone(&k)).collect()
    }
}

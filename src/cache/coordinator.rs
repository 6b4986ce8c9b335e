//! Single-flight fetch coordination.
//!
//! [`FetchCoordinator`] owns the [`TtlStore`] and the [`KeyLocks`] registry
//! and is the only thing that mutates either.
//!
//! # Request flow
//!
//! ```text
//! get_artifact(key, kind, force)
//!        │
//!        ├── !force && store hit ──────────────────────────► kind check ─► return
//!        │
//!        ▼
//!  acquire key lock (bounded wait)
//!        │
//!        ├── force: remove entry
//!        ├── !force && store hit (filled while waiting) ───► kind check ─► return
//!        │
//!        ▼
//!  source.fetch(key, kind) ─► store.put ─► return
//!        │
//!  lock released on every exit path (guard drop)
//! ```
//!
//! Both lookups are needed: the first keeps cache hits lock-free, the second
//! stops callers that queued behind a fetch from fetching again.
//!
//! Only successful population is shared. If the caller that fetched fails,
//! callers waiting behind it find no entry and each fetch for themselves.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use super::locks::{KeyLockGuard, KeyLocks};
use super::store::{CacheEntry, TtlStore};
use crate::config::{CacheConfig, LockTimeoutPolicy};
use crate::source::ArtifactSource;
use crate::telemetry;
use crate::types::{Artifact, ArtifactKind};
use crate::{Result, VaultCacheError};

/// Read-through cache engine over an [`ArtifactSource`].
pub struct FetchCoordinator {
    source: Arc<dyn ArtifactSource>,
    store: TtlStore,
    locks: KeyLocks,
    lock_timeout: LockTimeoutPolicy,
}

impl FetchCoordinator {
    pub fn new(source: Arc<dyn ArtifactSource>, config: &CacheConfig) -> Self {
        Self {
            source,
            store: TtlStore::new(config.ttl()),
            locks: KeyLocks::new(config.lock_wait, config.lock_retention),
            lock_timeout: config.lock_timeout,
        }
    }

    /// Return the artifact for `key`, fetching it from the source when it is
    /// not cached or when `force_refetch` is set.
    ///
    /// Fails with [`VaultCacheError::TypeMismatch`] when the cached artifact
    /// is not of `kind`, without contacting the source.
    ///
    /// A caller whose lock wait ran out under [`LockTimeoutPolicy::Proceed`]
    /// fetches without exclusive access and overwrites whatever entry is
    /// stored for `key` by then.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn get_artifact(
        &self,
        key: &str,
        kind: ArtifactKind,
        force_refetch: bool,
    ) -> Result<Artifact> {
        if !force_refetch && let Some(artifact) = self.store.get(key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => kind.as_str()).increment(1);
            debug!("served from cache");
            return coerce(key, kind, artifact);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "kind" => kind.as_str()).increment(1);

        let guard = self.locks.acquire(key).await;
        self.check_held(&guard, "get")?;

        if force_refetch {
            self.store.remove(key);
        } else if let Some(artifact) = self.store.get(key) {
            drop(guard);
            debug!("filled by a concurrent fetch");
            return coerce(key, kind, artifact);
        }

        let artifact = self.fetch(key, kind).await?;
        self.store.put(key, artifact.clone());
        debug!("added to cache");
        Ok(artifact)
    }

    /// Drop the entry for `key`. Absent keys are fine.
    ///
    /// Waits for any in-flight fetch of `key`, but proceeds once the lock
    /// wait runs out regardless of the configured timeout policy.
    #[instrument(skip(self))]
    pub async fn remove(&self, key: &str) {
        let guard = self.locks.acquire(key).await;
        if !guard.is_held() {
            metrics::counter!(telemetry::LOCK_TIMEOUTS_TOTAL, "operation" => "remove")
                .increment(1);
            warn!(waited = ?self.locks.wait(), "lock wait elapsed, removing anyway");
        }
        self.store.remove(key);
        metrics::counter!(telemetry::REMOVALS_TOTAL).increment(1);
        debug!("removed from cache");
    }

    /// Remove every cached key, one at a time.
    ///
    /// Not atomic: a key already cleared can be repopulated by a concurrent
    /// request before the remaining keys are cleared.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        for key in self.store.keys() {
            self.remove(&key).await;
        }
    }

    /// The live entry for `key`, without touching the source.
    pub fn cached(&self, key: &str) -> Option<CacheEntry> {
        self.store.entry(key)
    }

    /// Keys currently cached (possibly including ones about to expire).
    pub fn cached_keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// Number of keys with a registered lock.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    fn check_held(&self, guard: &KeyLockGuard<'_>, operation: &'static str) -> Result<()> {
        if guard.is_held() {
            return Ok(());
        }
        metrics::counter!(telemetry::LOCK_TIMEOUTS_TOTAL, "operation" => operation).increment(1);
        let waited = self.locks.wait();
        match self.lock_timeout {
            LockTimeoutPolicy::Proceed => {
                warn!(
                    key = guard.key(),
                    ?waited,
                    "lock wait elapsed, proceeding without exclusive access"
                );
                Ok(())
            }
            LockTimeoutPolicy::Fail => Err(VaultCacheError::LockTimeout {
                key: guard.key().to_owned(),
                waited,
            }),
        }
    }

    /// One source call, classified and timed.
    async fn fetch(&self, key: &str, kind: ArtifactKind) -> Result<Artifact> {
        let start = Instant::now();
        let result = self.source.fetch(key, kind).await;
        metrics::histogram!(telemetry::FETCH_DURATION_SECONDS, "kind" => kind.as_str())
            .record(start.elapsed().as_secs_f64());

        let (status, outcome) = match result {
            Ok(Some(artifact)) if artifact.kind() == kind => ("ok", Ok(artifact)),
            Ok(Some(artifact)) => (
                "mismatch",
                Err(VaultCacheError::TypeMismatch {
                    key: key.to_owned(),
                    expected: kind,
                    stored: artifact.kind(),
                }),
            ),
            Ok(None) => (
                "empty",
                Err(VaultCacheError::SourceReturnedEmpty {
                    key: key.to_owned(),
                    kind,
                }),
            ),
            Err(e) => ("error", Err(e)),
        };
        metrics::counter!(telemetry::FETCHES_TOTAL,
            "kind" => kind.as_str(),
            "status" => status,
        )
        .increment(1);
        if let Err(e) = &outcome {
            debug!(error = %e, "fetch failed");
        }
        outcome
    }
}

/// The kind check shared by every cache read.
fn coerce(key: &str, kind: ArtifactKind, artifact: Artifact) -> Result<Artifact> {
    if artifact.kind() == kind {
        Ok(artifact)
    } else {
        Err(VaultCacheError::TypeMismatch {
            key: key.to_owned(),
            expected: kind,
            stored: artifact.kind(),
        })
    }
}

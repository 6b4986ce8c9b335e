//! Builder for configuring cache instances

use std::sync::Arc;
use std::time::Duration;

use super::VaultCache;
use crate::config::{CacheConfig, LockRetention, LockTimeoutPolicy};
use crate::source::ArtifactSource;
use crate::{Result, VaultCacheError};

/// Builder for [`VaultCache`].
#[derive(Default)]
pub struct VaultCacheBuilder {
    source: Option<Arc<dyn ArtifactSource>>,
    config: CacheConfig,
}

impl VaultCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote store the cache reads through to. Required.
    pub fn source(mut self, source: Arc<dyn ArtifactSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the whole configuration, e.g. one loaded from TOML.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how long entries stay valid (zero = no expiry).
    pub fn caching_duration(mut self, duration: Duration) -> Self {
        self.config = self.config.caching_duration(duration);
        self
    }

    /// Set the bound on waiting for a key lock (default: 16s).
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.config = self.config.lock_wait(wait);
        self
    }

    /// Set the behaviour when a lock wait runs out on the fetch path.
    ///
    /// - [`LockTimeoutPolicy::Proceed`] — log a warning and fetch anyway (default)
    /// - [`LockTimeoutPolicy::Fail`] — return `LockTimeout`
    pub fn lock_timeout(mut self, policy: LockTimeoutPolicy) -> Self {
        self.config = self.config.lock_timeout(policy);
        self
    }

    /// Set whether per-key locks are kept for the life of the cache.
    pub fn lock_retention(mut self, retention: LockRetention) -> Self {
        self.config = self.config.lock_retention(retention);
        self
    }

    /// Build the cache.
    ///
    /// Fails with [`VaultCacheError::Configuration`] when no source is set or
    /// the configuration does not validate.
    pub fn build(self) -> Result<VaultCache> {
        let source = self
            .source
            .ok_or_else(|| VaultCacheError::Configuration("no artifact source configured".into()))?;
        self.config.validate()?;
        Ok(VaultCache::new(source, self.config))
    }
}

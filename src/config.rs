//! Cache configuration.
//!
//! [`CacheConfig`] is fixed at construction time and applies to every key.
//! It can be built in code:
//!
//! ```rust
//! # use vault_cache::{CacheConfig, LockTimeoutPolicy};
//! # use std::time::Duration;
//! let config = CacheConfig::new()
//!     .caching_duration(Duration::from_secs(300))
//!     .lock_timeout(LockTimeoutPolicy::Fail);
//! ```
//!
//! or loaded from TOML with the following resolution order:
//! 1. Explicit path (if provided)
//! 2. `~/.vault-cache/config.toml` (user)
//! 3. `/etc/vault-cache/config.toml` (system)
//!
//! When no file is found, defaults are used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Result, VaultCacheError};

/// Default bound on waiting for a key lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(16);

/// Longest accepted caching duration (100 years).
pub const MAX_CACHING_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// What to do when waiting for a key lock runs out of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockTimeoutPolicy {
    /// Log, then carry on without exclusive access.
    ///
    /// Two callers can end up fetching the same key at once, so the
    /// single-flight guarantee only holds while fetches finish inside the
    /// lock wait.
    #[default]
    Proceed,
    /// Fail the request with [`VaultCacheError::LockTimeout`].
    Fail,
}

/// Whether per-key locks outlive the operations that use them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockRetention {
    /// Keep one lock per key for the life of the cache.
    #[default]
    Retain,
    /// Drop a key's lock once nobody holds or waits on it.
    Reclaim,
}

/// Configuration for a cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long entries stay valid. Zero means they never expire. Default: zero.
    pub caching_duration: Duration,
    /// Bound on waiting for a key lock. Default: 16s.
    pub lock_wait: Duration,
    /// Behaviour when `lock_wait` elapses on the fetch path. Removal always
    /// proceeds. Default: [`LockTimeoutPolicy::Proceed`].
    pub lock_timeout: LockTimeoutPolicy,
    /// Default: [`LockRetention::Retain`].
    pub lock_retention: LockRetention,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            caching_duration: Duration::ZERO,
            lock_wait: DEFAULT_LOCK_WAIT,
            lock_timeout: LockTimeoutPolicy::default(),
            lock_retention: LockRetention::default(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how long entries stay valid (zero = no expiry).
    pub fn caching_duration(mut self, duration: Duration) -> Self {
        self.caching_duration = duration;
        self
    }

    /// Set the caching duration in whole seconds (zero = no expiry).
    pub fn caching_duration_secs(self, secs: u64) -> Self {
        self.caching_duration(Duration::from_secs(secs))
    }

    /// Set the bound on waiting for a key lock.
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn lock_timeout(mut self, policy: LockTimeoutPolicy) -> Self {
        self.lock_timeout = policy;
        self
    }

    pub fn lock_retention(mut self, retention: LockRetention) -> Self {
        self.lock_retention = retention;
        self
    }

    /// Entry lifetime, or `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        (!self.caching_duration.is_zero()).then_some(self.caching_duration)
    }

    /// Check that the values can back a cache.
    pub fn validate(&self) -> Result<()> {
        if self.caching_duration > MAX_CACHING_DURATION {
            return Err(VaultCacheError::Configuration(format!(
                "caching duration {:?} exceeds the maximum of {:?}",
                self.caching_duration, MAX_CACHING_DURATION
            )));
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| VaultCacheError::Configuration(format!("invalid config: {e}")))?;
        file.try_into()
    }

    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            VaultCacheError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(VaultCacheError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vault-cache").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/vault-cache/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

/// On-disk shape of the configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    caching_duration_secs: u64,
    #[serde(default = "default_lock_wait_secs")]
    lock_wait_secs: u64,
    #[serde(default)]
    lock_timeout: LockTimeoutPolicy,
    #[serde(default)]
    lock_retention: LockRetention,
}

fn default_lock_wait_secs() -> u64 {
    DEFAULT_LOCK_WAIT.as_secs()
}

impl TryFrom<ConfigFile> for CacheConfig {
    type Error = VaultCacheError;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let config = Self {
            caching_duration: Duration::from_secs(file.caching_duration_secs),
            lock_wait: Duration::from_secs(file.lock_wait_secs),
            lock_timeout: file.lock_timeout,
            lock_retention: file.lock_retention,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_means_no_ttl() {
        assert_eq!(CacheConfig::default().ttl(), None);
        assert_eq!(
            CacheConfig::new().caching_duration_secs(4).ttl(),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CacheConfig::from_toml_str("").unwrap(), CacheConfig::default());
    }

    #[test]
    fn maximum_duration_is_accepted() {
        let config = CacheConfig::new().caching_duration(MAX_CACHING_DURATION);
        assert!(config.validate().is_ok());
    }
}

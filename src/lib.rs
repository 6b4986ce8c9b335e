//! vault-cache - read-through cache for remote secret, certificate and key stores
//!
//! Remote secret stores are slow and rate limited. This crate keeps fetched
//! artifacts in memory, optionally for a fixed time, and makes sure that
//! concurrent requests for the same name cause at most one remote fetch.
//! Entries can be refetched on demand, removed one by one, or cleared.
//!
//! The remote store is anything implementing [`ArtifactSource`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vault_cache::{FileSource, VaultCache};
//!
//! #[tokio::main]
//! async fn main() -> vault_cache::Result<()> {
//!     let source = FileSource::load("fixtures/vault.json".as_ref())?;
//!     let cache = VaultCache::builder()
//!         .source(Arc::new(source))
//!         .caching_duration(Duration::from_secs(300))
//!         .build()?;
//!
//!     // First call goes to the store, the second is served from memory.
//!     let password = cache.secret("db-password", false).await?;
//!     let again = cache.secret("db-password", false).await?;
//!     assert_eq!(password, again);
//!
//!     // Bypass the cache and fetch a fresh copy.
//!     cache.secret("db-password", true).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod source;
pub mod telemetry;
pub mod types;
pub mod vault;

// Re-export main types at crate root
pub use cache::{CacheEntry, FetchCoordinator};
pub use config::{CacheConfig, LockRetention, LockTimeoutPolicy};
pub use error::{Result, VaultCacheError};
pub use source::{ArtifactSource, FileSource};
pub use types::{
    Artifact, ArtifactKind, Attributes, Bundle, CertificateBundle, JsonWebKey, KeyBundle,
    SecretBundle,
};
pub use vault::{VaultCache, VaultCacheBuilder};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

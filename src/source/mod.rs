//! The remote store seen from the cache.
//!
//! The cache depends on one capability only: fetch an artifact of a given
//! kind by name. Implementations perform a single attempt per call; any
//! retry or timeout policy belongs to the implementation, not to the cache.
//!
//! # Result contract
//!
//! - `Ok(Some(artifact))` — the artifact, expected to be of the requested kind
//! - `Ok(None)` — the call succeeded but the store returned nothing; the
//!   cache reports [`SourceReturnedEmpty`](crate::VaultCacheError::SourceReturnedEmpty)
//! - `Err(e)` — propagated to the caller unchanged
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl ArtifactSource for MyVault {
//!     fn name(&self) -> &str { "my-vault" }
//!
//!     async fn fetch(&self, key: &str, kind: ArtifactKind) -> Result<Option<Artifact>> {
//!         match kind {
//!             ArtifactKind::Secret => self.get_secret(key).await.map(|s| s.map(Into::into)),
//!             ArtifactKind::Certificate => self.get_certificate(key).await.map(|c| c.map(Into::into)),
//!             ArtifactKind::Key => self.get_key(key).await.map(|k| k.map(Into::into)),
//!         }
//!     }
//! }
//! ```

pub mod file;

pub use file::FileSource;

use async_trait::async_trait;

use crate::Result;
use crate::types::{Artifact, ArtifactKind};

/// Remote store capability consumed by the cache.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Source name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch the artifact of `kind` stored under `key`.
    async fn fetch(&self, key: &str, kind: ArtifactKind) -> Result<Option<Artifact>>;
}

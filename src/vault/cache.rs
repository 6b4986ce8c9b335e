//! VaultCache - typed getters over the fetch coordinator

use std::sync::Arc;

use crate::cache::FetchCoordinator;
use crate::config::CacheConfig;
use crate::source::ArtifactSource;
use crate::types::{Bundle, CertificateBundle, JsonWebKey, KeyBundle, SecretBundle};
use crate::{Result, VaultCacheError};

use super::VaultCacheBuilder;

/// Read-through cache for one remote store.
///
/// Create one instance per store and share it (it is `Send + Sync`). Every
/// getter takes `force_refetch`; set it to bypass the cached entry and fetch
/// from the store unconditionally.
pub struct VaultCache {
    coordinator: FetchCoordinator,
    config: CacheConfig,
}

impl VaultCache {
    /// Create a cache with the given configuration.
    pub fn new(source: Arc<dyn ArtifactSource>, config: CacheConfig) -> Self {
        Self {
            coordinator: FetchCoordinator::new(source, &config),
            config,
        }
    }

    pub fn builder() -> VaultCacheBuilder {
        VaultCacheBuilder::new()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The underlying coordinator, for kind-generic access.
    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    /// Fetch any bundle type through the cache.
    pub async fn bundle<B: Bundle>(&self, name: &str, force_refetch: bool) -> Result<B> {
        let artifact = self
            .coordinator
            .get_artifact(name, B::KIND, force_refetch)
            .await?;
        B::from_artifact(artifact).map_err(|other| VaultCacheError::TypeMismatch {
            key: name.to_owned(),
            expected: B::KIND,
            stored: other.kind(),
        })
    }

    /// Secret value and its metadata.
    pub async fn secret_bundle(&self, name: &str, force_refetch: bool) -> Result<SecretBundle> {
        self.bundle(name, force_refetch).await
    }

    /// Certificate and its metadata.
    pub async fn certificate_bundle(
        &self,
        name: &str,
        force_refetch: bool,
    ) -> Result<CertificateBundle> {
        self.bundle(name, force_refetch).await
    }

    /// Key and its metadata.
    pub async fn key_bundle(&self, name: &str, force_refetch: bool) -> Result<KeyBundle> {
        self.bundle(name, force_refetch).await
    }

    /// Secret value only.
    pub async fn secret(&self, name: &str, force_refetch: bool) -> Result<String> {
        Ok(self.secret_bundle(name, force_refetch).await?.value)
    }

    /// DER-encoded certificate only.
    pub async fn certificate(&self, name: &str, force_refetch: bool) -> Result<Vec<u8>> {
        Ok(self.certificate_bundle(name, force_refetch).await?.cer)
    }

    /// JSON Web Key only.
    pub async fn key(&self, name: &str, force_refetch: bool) -> Result<JsonWebKey> {
        Ok(self.key_bundle(name, force_refetch).await?.key)
    }

    /// Remove one entry. Absent entries are not an error.
    pub async fn remove(&self, name: &str) {
        self.coordinator.remove(name).await;
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.coordinator.clear().await;
    }
}

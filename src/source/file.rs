//! JSON-fixture source for development and testing.
//!
//! Loads a document of the form
//!
//! ```json
//! {
//!   "secrets":      { "db-password": { "id": "...", "value": "..." } },
//!   "certificates": { "tls": { "id": "...", "cer": [48, 130] } },
//!   "keys":         { "signing": { "id": "...", "key": { "kty": "EC" } } }
//! }
//! ```
//!
//! A name missing from the section for the requested kind is `NotFound`,
//! matching how a real store rejects a secret name asked for as a
//! certificate. A name mapped to `null` yields an empty result.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::ArtifactSource;
use crate::types::{Artifact, ArtifactKind, CertificateBundle, KeyBundle, SecretBundle};
use crate::{Result, VaultCacheError};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default)]
    secrets: HashMap<String, Option<SecretBundle>>,
    #[serde(default)]
    certificates: HashMap<String, Option<CertificateBundle>>,
    #[serde(default)]
    keys: HashMap<String, Option<KeyBundle>>,
}

/// [`ArtifactSource`] backed by an in-memory JSON fixture.
///
/// Counts every fetch and can add a fixed delay per call to imitate a slow
/// remote store.
#[derive(Debug)]
pub struct FileSource {
    fixture: Fixture,
    latency: Duration,
    fetches: AtomicU64,
}

impl FileSource {
    /// Parse a fixture document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self {
            fixture,
            latency: Duration::ZERO,
            fetches: AtomicU64::new(0),
        })
    }

    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VaultCacheError::Configuration(format!("Failed to read fixture {path:?}: {e}"))
        })?;
        Self::from_json_str(&content)
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, key: &str, kind: ArtifactKind) -> Option<Option<Artifact>> {
        match kind {
            ArtifactKind::Secret => self
                .fixture
                .secrets
                .get(key)
                .map(|b| b.clone().map(Into::into)),
            ArtifactKind::Certificate => self
                .fixture
                .certificates
                .get(key)
                .map(|b| b.clone().map(Into::into)),
            ArtifactKind::Key => self
                .fixture
                .keys
                .get(key)
                .map(|b| b.clone().map(Into::into)),
        }
    }
}

#[async_trait]
impl ArtifactSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, key: &str, kind: ArtifactKind) -> Result<Option<Artifact>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(key, %kind, "fixture lookup");
        self.lookup(key, kind)
            .ok_or_else(|| VaultCacheError::NotFound(format!("{kind} '{key}'")))
    }
}

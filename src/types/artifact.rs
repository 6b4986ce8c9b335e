//! Kind-tagged artifacts and typed extraction.
//!
//! The set of artifact kinds is closed: the remote store serves secrets,
//! certificates and keys, and nothing else. [`ArtifactKind`] is the tag
//! passed to the fetch source; [`Artifact`] is what comes back and what the
//! cache stores. [`Bundle`] recovers the concrete payload type from an
//! [`Artifact`] without open-ended downcasting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bundle::{CertificateBundle, KeyBundle, SecretBundle};

/// The kind of artifact a caller requests from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Secret,
    Certificate,
    Key,
}

impl ArtifactKind {
    /// All kinds, in declaration order.
    pub const ALL: [ArtifactKind; 3] = [Self::Secret, Self::Certificate, Self::Key];

    /// Lowercase name, also used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::Certificate => "certificate",
            Self::Key => "key",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secret" => Ok(Self::Secret),
            "certificate" | "cert" => Ok(Self::Certificate),
            "key" => Ok(Self::Key),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

/// An artifact fetched from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Artifact {
    Secret(SecretBundle),
    Certificate(CertificateBundle),
    Key(KeyBundle),
}

impl Artifact {
    /// The kind tag of this artifact.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Secret(_) => ArtifactKind::Secret,
            Self::Certificate(_) => ArtifactKind::Certificate,
            Self::Key(_) => ArtifactKind::Key,
        }
    }

    /// Store identifier of the wrapped bundle.
    pub fn id(&self) -> &str {
        match self {
            Self::Secret(b) => &b.id,
            Self::Certificate(b) => &b.id,
            Self::Key(b) => &b.id,
        }
    }
}

impl From<SecretBundle> for Artifact {
    fn from(bundle: SecretBundle) -> Self {
        Self::Secret(bundle)
    }
}

impl From<CertificateBundle> for Artifact {
    fn from(bundle: CertificateBundle) -> Self {
        Self::Certificate(bundle)
    }
}

impl From<KeyBundle> for Artifact {
    fn from(bundle: KeyBundle) -> Self {
        Self::Key(bundle)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::SecretBundle {}
    impl Sealed for super::CertificateBundle {}
    impl Sealed for super::KeyBundle {}
}

/// A concrete payload type that maps one-to-one onto an [`ArtifactKind`].
///
/// Sealed: implemented for [`SecretBundle`], [`CertificateBundle`] and
/// [`KeyBundle`] only.
pub trait Bundle: sealed::Sealed + Into<Artifact> + Sized {
    /// The kind tag this payload is stored under.
    const KIND: ArtifactKind;

    /// Unwrap the payload, handing the artifact back if it is another kind.
    fn from_artifact(artifact: Artifact) -> Result<Self, Artifact>;
}

impl Bundle for SecretBundle {
    const KIND: ArtifactKind = ArtifactKind::Secret;

    fn from_artifact(artifact: Artifact) -> Result<Self, Artifact> {
        match artifact {
            Artifact::Secret(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl Bundle for CertificateBundle {
    const KIND: ArtifactKind = ArtifactKind::Certificate;

    fn from_artifact(artifact: Artifact) -> Result<Self, Artifact> {
        match artifact {
            Artifact::Certificate(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl Bundle for KeyBundle {
    const KIND: ArtifactKind = ArtifactKind::Key;

    fn from_artifact(artifact: Artifact) -> Result<Self, Artifact> {
        match artifact {
            Artifact::Key(b) => Ok(b),
            other => Err(other),
        }
    }
}

//! Public types for the vault-cache API.

mod artifact;
mod bundle;

pub use artifact::{Artifact, ArtifactKind, Bundle};
pub use bundle::{Attributes, CertificateBundle, JsonWebKey, KeyBundle, SecretBundle};

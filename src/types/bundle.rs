//! Artifact payloads returned by the remote store.
//!
//! Each bundle carries the material itself plus the store's metadata for it.
//! Field names follow the JSON shape used by the file source fixtures.

use serde::{Deserialize, Serialize};

/// Lifecycle metadata attached to every stored artifact.
///
/// Timestamps are Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
}

/// A secret value and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBundle {
    /// Store identifier of this secret version.
    pub id: String,
    /// The secret value.
    pub value: String,
    /// Optional MIME-ish hint set by whoever stored the secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl SecretBundle {
    /// Create a bundle with empty metadata.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            content_type: None,
            attributes: Attributes::default(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A certificate (DER bytes) and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBundle {
    pub id: String,
    /// DER-encoded certificate.
    pub cer: Vec<u8>,
    /// Hex SHA-1 thumbprint, when the store reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl CertificateBundle {
    pub fn new(id: impl Into<String>, cer: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            cer: cer.into(),
            thumbprint: None,
            attributes: Attributes::default(),
        }
    }
}

/// Public portion of a stored key, in JSON Web Key form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Key type, e.g. `"RSA"` or `"EC"`.
    pub kty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ops: Vec<String>,
    // RSA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    // EC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// A key and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    pub id: String,
    pub key: JsonWebKey,
    #[serde(default)]
    pub attributes: Attributes,
}

impl KeyBundle {
    pub fn new(id: impl Into<String>, key: JsonWebKey) -> Self {
        Self {
            id: id.into(),
            key,
            attributes: Attributes::default(),
        }
    }
}

//! Control-plane trait and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during control-plane operations.
#[derive(Error, Debug)]
pub enum CloudProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Operation timed out.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A long-running operation finished with an error.
    #[error("Operation {name} failed: {message}")]
    Operation { name: String, message: String },
}

/// Key material protection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionLevel {
    /// Software-backed key material.
    #[default]
    Software,
    /// Key material held in a hardware security module.
    Hsm,
}

impl ProtectionLevel {
    /// Value used by the KMS API.
    #[must_use]
    pub fn api_value(self) -> &'static str {
        match self {
            Self::Software => "SOFTWARE",
            Self::Hsm => "HSM",
        }
    }
}

impl std::fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software => write!(f, "software"),
            Self::Hsm => write!(f, "hsm"),
        }
    }
}

impl std::str::FromStr for ProtectionLevel {
    type Err = CloudProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "software" => Ok(Self::Software),
            "hsm" => Ok(Self::Hsm),
            _ => Err(CloudProviderError::Config(format!(
                "Unknown protection level: {s}. Supported: hsm, software"
            ))),
        }
    }
}

/// Address of a key ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRingRef<'a> {
    /// Project ID.
    pub project: &'a str,
    /// KMS location (e.g., "europe").
    pub location: &'a str,
    /// Key ring name.
    pub name: &'a str,
}

impl KeyRingRef<'_> {
    /// Full resource name of the key ring.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/keyRings/{}",
            self.project, self.location, self.name
        )
    }
}

/// Address of a crypto key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKeyRef<'a> {
    /// Key ring holding the key.
    pub key_ring: KeyRingRef<'a>,
    /// Key name.
    pub name: &'a str,
}

impl CryptoKeyRef<'_> {
    /// Full resource name of the crypto key.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!("{}/cryptoKeys/{}", self.key_ring.resource_name(), self.name)
    }
}

/// The control-plane calls the provisioner depends on.
///
/// Describe calls report existence as `Ok(true)` / `Ok(false)`; every other
/// failure is an error. Create calls may fail with
/// [`CloudProviderError::AlreadyExists`], but callers should treat the
/// matching describe call as the source of truth.
#[async_trait]
pub trait KmsControlPlane: Send + Sync {
    /// Enable an API on the project and wait until it is usable.
    async fn enable_service(&self, project: &str, service: &str)
        -> Result<(), CloudProviderError>;

    /// Trigger creation of the provider-managed service identity for a service.
    async fn ensure_service_identity(
        &self,
        project: &str,
        service: &str,
    ) -> Result<(), CloudProviderError>;

    /// Resolve the numeric project identifier.
    async fn describe_project(&self, project: &str) -> Result<String, CloudProviderError>;

    /// Create a key ring.
    async fn create_key_ring(&self, key_ring: &KeyRingRef<'_>) -> Result<(), CloudProviderError>;

    /// Check whether a key ring exists.
    async fn describe_key_ring(&self, key_ring: &KeyRingRef<'_>)
        -> Result<bool, CloudProviderError>;

    /// Create a symmetric encryption key.
    async fn create_crypto_key(
        &self,
        key: &CryptoKeyRef<'_>,
        protection_level: ProtectionLevel,
    ) -> Result<(), CloudProviderError>;

    /// Check whether a crypto key exists.
    async fn describe_crypto_key(&self, key: &CryptoKeyRef<'_>)
        -> Result<bool, CloudProviderError>;

    /// Grant `role` to `member` on `resource`. Granting an existing binding succeeds.
    async fn add_iam_policy_binding(
        &self,
        resource: &str,
        member: &str,
        role: &str,
    ) -> Result<(), CloudProviderError>;
}

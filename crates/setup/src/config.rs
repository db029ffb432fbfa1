//! Provisioning configuration types.
//!
//! This module defines the request collected from the operator and the fixed
//! values the provisioner works with.

use cmek_cloud::{CryptoKeyRef, KeyRingRef, ProtectionLevel};
use serde::{Deserialize, Serialize};

/// Default key ring name.
pub const DEFAULT_KEY_RING_NAME: &str = "notebooklm_keyring";

/// Default crypto key name.
pub const DEFAULT_KEY_NAME: &str = "notebooklm_cmek_key";

/// KMS location for the key ring and key.
pub const KMS_LOCATION: &str = "europe";

/// APIs that must be enabled before anything else can succeed.
pub const REQUIRED_SERVICES: [&str; 2] =
    ["cloudkms.googleapis.com", "discoveryengine.googleapis.com"];

/// Role granted to the service agents on the key.
pub const ENCRYPTER_DECRYPTER_ROLE: &str = "roles/cloudkms.cryptoKeyEncrypterDecrypter";

/// Location of the product's data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStoreLocation {
    /// United States multi-region.
    Us,
    /// European Union multi-region.
    Eu,
}

impl std::fmt::Display for DataStoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Us => write!(f, "us"),
            Self::Eu => write!(f, "eu"),
        }
    }
}

impl std::str::FromStr for DataStoreLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            _ => Err(anyhow::anyhow!(
                "Unknown data store location: {s}. Supported: us, eu"
            )),
        }
    }
}

/// Everything the provisioner needs, collected once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    /// Target project ID.
    pub project_id: String,
    /// Key ring name.
    pub key_ring_name: String,
    /// Crypto key name.
    pub key_name: String,
    /// Protection level for the key material.
    pub protection_level: ProtectionLevel,
    /// KMS location (always [`KMS_LOCATION`]).
    pub kms_location: String,
    /// Location of the product's data store.
    pub data_store_location: DataStoreLocation,
}

impl ProvisioningRequest {
    /// Create a request with default names and protection level.
    #[must_use]
    pub fn with_defaults(project_id: String, data_store_location: DataStoreLocation) -> Self {
        Self {
            project_id,
            key_ring_name: DEFAULT_KEY_RING_NAME.into(),
            key_name: DEFAULT_KEY_NAME.into(),
            protection_level: ProtectionLevel::default(),
            kms_location: KMS_LOCATION.into(),
            data_store_location,
        }
    }

    /// Address of the key ring.
    #[must_use]
    pub fn key_ring(&self) -> KeyRingRef<'_> {
        KeyRingRef {
            project: &self.project_id,
            location: &self.kms_location,
            name: &self.key_ring_name,
        }
    }

    /// Address of the crypto key.
    #[must_use]
    pub fn crypto_key(&self) -> CryptoKeyRef<'_> {
        CryptoKeyRef {
            key_ring: self.key_ring(),
            name: &self.key_name,
        }
    }

    /// Full resource name of the crypto key.
    #[must_use]
    pub fn crypto_key_resource(&self) -> String {
        self.crypto_key().resource_name()
    }
}

//! Control-plane abstractions.
//!
//! This module defines the trait the provisioner talks to and its GCP
//! implementation.

pub mod gcp;
mod traits;

pub use traits::{
    CloudProviderError, CryptoKeyRef, KeyRingRef, KmsControlPlane, ProtectionLevel,
};

pub use gcp::Gcp;

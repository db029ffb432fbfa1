//! Google Cloud control-plane client for CMEK provisioning.
//!
//! This crate provides the calls needed to prepare a project for
//! customer-managed encryption keys:
//!
//! - **Service Usage** - enable APIs, provision service identities
//! - **Resource Manager** - resolve project numbers
//! - **Cloud KMS** - key rings, crypto keys, IAM bindings on keys
//!
//! The provisioner depends only on the [`KmsControlPlane`] trait; [`Gcp`] is
//! the REST implementation.

pub mod auth;
pub mod providers;

pub use providers::{
    gcp, CloudProviderError, CryptoKeyRef, Gcp, KeyRingRef, KmsControlPlane, ProtectionLevel,
};

//! GCP (Google Cloud Platform) provider.
//!
//! Implements the [`KmsControlPlane`](super::KmsControlPlane) trait against
//! the public Google REST APIs.
//!
//! ## Services
//!
//! - **Service Usage** - API enablement and service identities
//! - **Resource Manager** - Project number lookup
//! - **Cloud KMS** - Key rings, crypto keys and their IAM policies
//! - **Cloud Storage** - Storage service agent provisioning

mod client;
mod models;

pub use client::{Gcp, GcpEndpoints};
pub use models::*;

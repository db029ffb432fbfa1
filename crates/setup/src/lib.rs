//! CMEK Setup Library.
//!
//! Provisions the Google Cloud resources needed for customer-managed
//! encryption keys and exposes the pipeline for programmatic use.
//!
//! # Example
//!
//! ```ignore
//! use cmek_cloud::{auth::resolve_access_token, Gcp};
//! use cmek_setup::{DataStoreLocation, ProvisioningRequest, Provisioner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let request = ProvisioningRequest::with_defaults("my-project".into(), DataStoreLocation::Eu);
//!     let gcp = Gcp::new(resolve_access_token().await?)?;
//!     let report = Provisioner::new(&gcp, &request).run().await?;
//!     println!("{}", report.key_resource);
//!     Ok(())
//! }
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod orchestrator;
pub mod prompt;
pub mod service_agent;
pub mod stage;
pub mod ui;
pub mod validator;

// Re-export commonly used types at the crate root
pub use config::{DataStoreLocation, ProvisioningRequest};
pub use orchestrator::{EnsureOutcome, ProvisionError, Provisioner, ProvisioningReport};
pub use service_agent::ServiceAgent;
pub use stage::{Gate, Stage};
pub use validator::PrerequisitesValidator;

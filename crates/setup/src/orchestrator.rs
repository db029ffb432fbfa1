//! Provisioning orchestration.
//!
//! This module runs the provisioning stages against a [`KmsControlPlane`]:
//! - API enablement and service agent provisioning
//! - Project number resolution
//! - Key ring and crypto key creation with read-after-write checks
//! - IAM bindings for the service agents
//!
//! Every stage is idempotent, so a partially completed run can simply be
//! started again.

use std::future::Future;

use cmek_cloud::{CloudProviderError, KmsControlPlane};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ProvisioningRequest, ENCRYPTER_DECRYPTER_ROLE, REQUIRED_SERVICES};
use crate::service_agent::ServiceAgent;
use crate::stage::{Gate, Stage};
use crate::ui;

/// Failures that end a provisioning run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A required API could not be enabled.
    #[error("Failed to enable {service}: {source}")]
    EnableApi {
        service: String,
        #[source]
        source: CloudProviderError,
    },

    /// The project could not be described.
    #[error("Failed to resolve project number for {project}: {source}")]
    ProjectNumber {
        project: String,
        #[source]
        source: CloudProviderError,
    },

    /// The project was described but has no number.
    #[error("Project {0} returned an empty project number")]
    EmptyProjectNumber(String),

    /// The key ring is not present after the creation attempt.
    #[error("Key ring {name} not found in {location} after creation attempt")]
    KeyRingMissing { name: String, location: String },

    /// The crypto key is not present after the creation attempt.
    #[error("Crypto key {name} not found in key ring {key_ring} after creation attempt")]
    CryptoKeyMissing { name: String, key_ring: String },
}

/// Result of ensuring a resource exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// The resource was there before this run.
    AlreadyExisted,
    /// This run created the resource.
    Created,
}

impl std::fmt::Display for EnsureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExisted => write!(f, "already existed"),
            Self::Created => write!(f, "created"),
        }
    }
}

/// When [`ensure_resource`] confirms existence with a describe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Describe after every create attempt.
    Always,
    /// Describe only when the create call failed.
    OnFailure,
}

/// A failure in a soft stage.
#[derive(Debug, Clone, Serialize)]
pub struct SoftFailure {
    /// Stage the failure happened in.
    pub stage: Stage,
    /// What was being provisioned (service or member).
    pub subject: String,
    /// Error message.
    pub message: String,
}

/// Outcome of a provisioning run that reached the end.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    /// Numeric project identifier.
    pub project_number: String,
    /// Key ring outcome.
    pub key_ring: EnsureOutcome,
    /// Crypto key outcome.
    pub crypto_key: EnsureOutcome,
    /// Full resource name of the crypto key.
    pub key_resource: String,
    /// Service agent emails derived from the project number.
    pub service_agents: Vec<String>,
    /// Failures in soft stages.
    pub soft_failures: Vec<SoftFailure>,
}

impl ProvisioningReport {
    /// Whether every stage succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.soft_failures.is_empty()
    }
}

/// Create a resource, then use a describe call as the source of truth.
///
/// The create error is never trusted on its own: "already exists" and any
/// other failure both fall through to the describe check.
///
/// # Errors
///
/// Returns `missing` if the resource cannot be shown to exist.
pub async fn ensure_resource<C, D, F>(
    kind: &'static str,
    create: C,
    describe: D,
    verification: Verification,
    missing: ProvisionError,
) -> Result<EnsureOutcome, ProvisionError>
where
    C: Future<Output = Result<(), CloudProviderError>>,
    D: FnOnce() -> F,
    F: Future<Output = Result<bool, CloudProviderError>>,
{
    let created = match create.await {
        Ok(()) => true,
        Err(CloudProviderError::AlreadyExists(message)) => {
            info!(kind, message = %message, "Resource reported as already existing");
            false
        }
        Err(e) => {
            warn!(kind, error = %e, "Create failed, checking whether resource exists");
            false
        }
    };

    if created && verification == Verification::OnFailure {
        return Ok(EnsureOutcome::Created);
    }

    match describe().await {
        Ok(true) if created => Ok(EnsureOutcome::Created),
        Ok(true) => Ok(EnsureOutcome::AlreadyExisted),
        Ok(false) => {
            error!(kind, "Resource not found after creation attempt");
            Err(missing)
        }
        Err(e) => {
            error!(kind, error = %e, "Failed to describe resource");
            Err(missing)
        }
    }
}

/// Runs the provisioning stages for one request.
pub struct Provisioner<'a, C: KmsControlPlane + ?Sized> {
    /// Control plane to provision against.
    plane: &'a C,
    /// What to provision.
    request: &'a ProvisioningRequest,
}

impl<'a, C: KmsControlPlane + ?Sized> Provisioner<'a, C> {
    /// Create a provisioner for a request.
    #[must_use]
    pub fn new(plane: &'a C, request: &'a ProvisioningRequest) -> Self {
        Self { plane, request }
    }

    /// Run every stage in order.
    ///
    /// Soft-stage failures are recorded in the report; hard-stage failures end
    /// the run. Nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns the first hard-stage failure.
    pub async fn run(&self) -> Result<ProvisioningReport, ProvisionError> {
        let mut soft_failures = Vec::new();

        Self::begin(Stage::EnablingApis);
        self.enable_apis().await?;

        Self::begin(Stage::ProvisioningServiceAgents);
        soft_failures.extend(self.provision_service_agents().await);

        Self::begin(Stage::ResolvingProjectNumber);
        let project_number = self.resolve_project_number().await?;

        Self::begin(Stage::EnsuringKeyRing);
        let key_ring = self.ensure_key_ring().await?;

        Self::begin(Stage::EnsuringCryptoKey);
        let crypto_key = self.ensure_crypto_key().await?;

        Self::begin(Stage::GrantingIamBindings);
        soft_failures.extend(self.grant_bindings(&project_number).await);

        info!(soft_failures = soft_failures.len(), "SETUP COMPLETE");

        Ok(ProvisioningReport {
            service_agents: ServiceAgent::ALL
                .iter()
                .map(|agent| agent.email(&project_number))
                .collect(),
            project_number,
            key_ring,
            crypto_key,
            key_resource: self.request.crypto_key_resource(),
            soft_failures,
        })
    }

    fn begin(stage: Stage) {
        info!(stage = ?stage, gate = ?stage.gate(), "Executing stage");
        ui::print_progress_step(stage.step_number(), Stage::TOTAL_STAGES, stage.description());
    }

    /// Record a failure in a soft stage.
    fn soft_failure(stage: Stage, subject: &str, error: &CloudProviderError) -> SoftFailure {
        debug_assert_eq!(stage.gate(), Gate::Soft);
        error!(stage = ?stage, subject = %subject, error = %error, "Stage step failed, continuing");
        SoftFailure {
            stage,
            subject: subject.to_string(),
            message: error.to_string(),
        }
    }

    async fn enable_apis(&self) -> Result<(), ProvisionError> {
        for service in REQUIRED_SERVICES {
            self.plane
                .enable_service(&self.request.project_id, service)
                .await
                .map_err(|source| ProvisionError::EnableApi {
                    service: service.to_string(),
                    source,
                })?;
            ui::print_success(&format!("{service} enabled"));
        }
        Ok(())
    }

    async fn provision_service_agents(&self) -> Vec<SoftFailure> {
        let mut failures = Vec::new();
        for agent in ServiceAgent::ALL {
            match self
                .plane
                .ensure_service_identity(&self.request.project_id, agent.service())
                .await
            {
                Ok(()) => ui::print_success(&format!("{agent} service agent ready")),
                Err(e) => failures.push(Self::soft_failure(
                    Stage::ProvisioningServiceAgents,
                    agent.service(),
                    &e,
                )),
            }
        }
        failures
    }

    async fn resolve_project_number(&self) -> Result<String, ProvisionError> {
        let project = &self.request.project_id;
        let number = self
            .plane
            .describe_project(project)
            .await
            .map_err(|source| ProvisionError::ProjectNumber {
                project: project.clone(),
                source,
            })?;

        let number = number.trim().to_string();
        if number.is_empty() {
            return Err(ProvisionError::EmptyProjectNumber(project.clone()));
        }

        info!(project = %project, project_number = %number, "Project number resolved");
        Ok(number)
    }

    async fn ensure_key_ring(&self) -> Result<EnsureOutcome, ProvisionError> {
        let key_ring = self.request.key_ring();
        let outcome = ensure_resource(
            "key_ring",
            self.plane.create_key_ring(&key_ring),
            || self.plane.describe_key_ring(&key_ring),
            Verification::Always,
            ProvisionError::KeyRingMissing {
                name: self.request.key_ring_name.clone(),
                location: self.request.kms_location.clone(),
            },
        )
        .await?;

        ui::print_success(&format!("Key ring {} {outcome}", self.request.key_ring_name));
        Ok(outcome)
    }

    async fn ensure_crypto_key(&self) -> Result<EnsureOutcome, ProvisionError> {
        let key = self.request.crypto_key();
        let outcome = ensure_resource(
            "crypto_key",
            self.plane
                .create_crypto_key(&key, self.request.protection_level),
            || self.plane.describe_crypto_key(&key),
            Verification::OnFailure,
            ProvisionError::CryptoKeyMissing {
                name: self.request.key_name.clone(),
                key_ring: self.request.key_ring_name.clone(),
            },
        )
        .await?;

        ui::print_success(&format!("Crypto key {} {outcome}", self.request.key_name));
        Ok(outcome)
    }

    async fn grant_bindings(&self, project_number: &str) -> Vec<SoftFailure> {
        let resource = self.request.crypto_key_resource();
        let mut failures = Vec::new();

        for agent in ServiceAgent::ALL {
            let member = agent.member(project_number);
            match self
                .plane
                .add_iam_policy_binding(&resource, &member, ENCRYPTER_DECRYPTER_ROLE)
                .await
            {
                Ok(()) => ui::print_success(&format!("{agent} service agent can use the key")),
                Err(e) => failures.push(Self::soft_failure(
                    Stage::GrantingIamBindings,
                    &member,
                    &e,
                )),
            }
        }
        failures
    }
}

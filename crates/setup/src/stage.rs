//! Provisioning stages.
//!
//! The provisioner walks these stages in order. Each stage is either a hard
//! gate (a failure ends the run) or soft (failures are logged and recorded).

use serde::Serialize;

/// How a stage failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Failure aborts the run.
    Hard,
    /// Failure is logged and the run continues.
    Soft,
}

/// Provisioning stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Enabling the required APIs.
    EnablingApis,
    /// Provisioning service agents.
    ProvisioningServiceAgents,
    /// Resolving the project number.
    ResolvingProjectNumber,
    /// Ensuring the key ring exists.
    EnsuringKeyRing,
    /// Ensuring the crypto key exists.
    EnsuringCryptoKey,
    /// Granting the service agents access to the key.
    GrantingIamBindings,
}

impl Stage {
    /// Total number of stages.
    pub const TOTAL_STAGES: u8 = 6;

    /// Get a human-readable description of the stage.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::EnablingApis => "Enabling required APIs",
            Self::ProvisioningServiceAgents => "Provisioning service agents",
            Self::ResolvingProjectNumber => "Resolving project number",
            Self::EnsuringKeyRing => "Ensuring key ring",
            Self::EnsuringCryptoKey => "Ensuring crypto key",
            Self::GrantingIamBindings => "Granting key access to service agents",
        }
    }

    /// Get the stage number for progress display.
    #[must_use]
    pub fn step_number(self) -> u8 {
        match self {
            Self::EnablingApis => 1,
            Self::ProvisioningServiceAgents => 2,
            Self::ResolvingProjectNumber => 3,
            Self::EnsuringKeyRing => 4,
            Self::EnsuringCryptoKey => 5,
            Self::GrantingIamBindings => 6,
        }
    }

    /// How failures in this stage are treated.
    #[must_use]
    pub fn gate(self) -> Gate {
        match self {
            Self::ProvisioningServiceAgents | Self::GrantingIamBindings => Gate::Soft,
            _ => Gate::Hard,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

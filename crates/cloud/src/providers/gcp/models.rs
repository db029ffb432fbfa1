//! GCP API request and response models.

use serde::{Deserialize, Serialize};

// ============================================================================
// Service Usage types
// ============================================================================

/// Long-running operation returned by Service Usage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name (e.g., "operations/acf.p2-123").
    #[serde(default)]
    pub name: String,
    /// Whether the operation has finished.
    #[serde(default)]
    pub done: bool,
    /// Error, if the operation finished unsuccessfully.
    pub error: Option<Status>,
}

/// RPC status attached to a failed operation.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// Canonical error code.
    #[serde(default)]
    pub code: i32,
    /// Developer-facing message.
    #[serde(default)]
    pub message: String,
}

/// Empty request body.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Cloud Storage service account for a project.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageServiceAccount {
    /// Service agent email.
    pub email_address: String,
}

// ============================================================================
// Resource Manager types
// ============================================================================

/// Project as returned by Resource Manager v1.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project ID.
    #[serde(default)]
    pub project_id: String,
    /// Numeric project identifier.
    #[serde(default)]
    pub project_number: String,
    /// Lifecycle state.
    pub lifecycle_state: Option<String>,
}

// ============================================================================
// KMS types
// ============================================================================

/// KMS key ring.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRing {
    /// Full resource name.
    pub name: String,
    /// Create time.
    pub create_time: Option<String>,
}

/// KMS crypto key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKey {
    /// Full resource name.
    pub name: String,
    /// Key purpose.
    pub purpose: Option<String>,
    /// Create time.
    pub create_time: Option<String>,
    /// Template for new versions.
    pub version_template: Option<CryptoKeyVersionTemplate>,
}

/// Create crypto key request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeyDefinition {
    /// Key purpose.
    pub purpose: String,
    /// Template for new versions.
    pub version_template: CryptoKeyVersionTemplate,
}

/// Crypto key version template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeyVersionTemplate {
    /// Protection level ("SOFTWARE" or "HSM").
    pub protection_level: String,
    /// Algorithm.
    pub algorithm: String,
}

// ============================================================================
// IAM types
// ============================================================================

/// IAM policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Policy version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    /// Role bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    /// Concurrency control tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Policy {
    /// Whether `member` already holds `role` unconditionally.
    #[must_use]
    pub fn has_binding(&self, member: &str, role: &str) -> bool {
        self.bindings.iter().any(|b| {
            b.role == role && b.condition.is_none() && b.members.iter().any(|m| m == member)
        })
    }

    /// Add `member` to the unconditional binding for `role`, creating it if needed.
    ///
    /// Returns `false` when the policy already contained the binding.
    pub fn add_binding(&mut self, member: &str, role: &str) -> bool {
        if self.has_binding(member, role) {
            return false;
        }

        if let Some(binding) = self
            .bindings
            .iter_mut()
            .find(|b| b.role == role && b.condition.is_none())
        {
            binding.members.push(member.to_string());
        } else {
            self.bindings.push(Binding {
                role: role.to_string(),
                members: vec![member.to_string()],
                condition: None,
            });
        }
        true
    }
}

/// A role binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Role name.
    pub role: String,
    /// Members granted the role.
    #[serde(default)]
    pub members: Vec<String>,
    /// Optional condition, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
}

/// `getIamPolicy` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIamPolicyRequest {
    /// Policy options.
    pub options: GetPolicyOptions,
}

/// Options for `getIamPolicy`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPolicyOptions {
    /// Highest policy version the caller understands.
    pub requested_policy_version: i32,
}

/// `setIamPolicy` request body.
#[derive(Debug, Serialize)]
pub struct SetIamPolicyRequest {
    /// The complete policy to apply.
    pub policy: Policy,
}

// ============================================================================
// Error envelope
// ============================================================================

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub error: ErrorBody,
}

/// Body of a Google API error.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    #[serde(default)]
    pub code: u16,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Canonical status (e.g., "ALREADY_EXISTS").
    #[serde(default)]
    pub status: String,
}

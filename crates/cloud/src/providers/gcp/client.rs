//! GCP API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::models::{
    CryptoKey, CryptoKeyDefinition, CryptoKeyVersionTemplate, Empty, ErrorEnvelope,
    GetIamPolicyRequest, GetPolicyOptions, KeyRing, Operation, Policy, Project,
    SetIamPolicyRequest, StorageServiceAccount,
};
use crate::providers::traits::{
    CloudProviderError, CryptoKeyRef, KeyRingRef, KmsControlPlane, ProtectionLevel,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Polling interval when waiting for long-running operations.
const POLL_INTERVAL_SECS: u64 = 2;

/// How long to wait for a long-running operation before giving up.
const OPERATION_TIMEOUT_SECS: u64 = 120;

/// Cloud Storage provisions its service agent through its own API.
const STORAGE_SERVICE: &str = "storage.googleapis.com";

/// Highest IAM policy version this client understands.
const IAM_POLICY_VERSION: i32 = 3;

/// Base URLs for the Google APIs used by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpEndpoints {
    /// Service Usage API.
    pub service_usage: String,
    /// Resource Manager API.
    pub resource_manager: String,
    /// Cloud KMS API.
    pub kms: String,
    /// Cloud Storage JSON API.
    pub storage: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            service_usage: "https://serviceusage.googleapis.com".to_string(),
            resource_manager: "https://cloudresourcemanager.googleapis.com".to_string(),
            kms: "https://cloudkms.googleapis.com".to_string(),
            storage: "https://storage.googleapis.com".to_string(),
        }
    }
}

impl GcpEndpoints {
    /// Route every API to a single base URL (used with mock servers).
    #[must_use]
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            service_usage: base.clone(),
            resource_manager: base.clone(),
            kms: base.clone(),
            storage: base,
        }
    }
}

/// GCP control plane backed by the public REST APIs.
#[derive(Clone)]
pub struct Gcp {
    /// HTTP client.
    client: Client,
    /// Access token (from service account or user).
    access_token: String,
    /// API base URLs.
    endpoints: GcpEndpoints,
    /// Delay between operation polls.
    poll_interval: Duration,
    /// Operation polling timeout.
    operation_timeout: Duration,
}

impl Gcp {
    /// Create a new GCP client.
    ///
    /// # Arguments
    /// * `access_token` - `OAuth2` access token
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> Result<Self, CloudProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(CloudProviderError::Http)?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            endpoints: GcpEndpoints::default(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(OPERATION_TIMEOUT_SECS),
        })
    }

    /// Override the API base URLs.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: GcpEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override operation polling.
    #[must_use]
    pub fn with_operation_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.operation_timeout = timeout;
        self
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, CloudProviderError> {
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, CloudProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// GET a resource and report whether it exists.
    async fn exists<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<bool, CloudProviderError> {
        match self.get::<T>(url).await {
            Ok(_) => Ok(true),
            Err(CloudProviderError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Handle API response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CloudProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                CloudProviderError::Serialization(e)
            })
        } else {
            Err(Self::classify_error(status, &text))
        }
    }

    /// Map an unsuccessful response to an error.
    fn classify_error(status: StatusCode, text: &str) -> CloudProviderError {
        // Prefer the message from the Google error envelope when present
        let message = serde_json::from_str::<ErrorEnvelope>(text)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| text.to_string());

        match status {
            StatusCode::NOT_FOUND => CloudProviderError::NotFound(message),
            StatusCode::CONFLICT => CloudProviderError::AlreadyExists(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CloudProviderError::Auth(message),
            _ => CloudProviderError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Build a URL with a single query parameter.
    fn url_with_param(base: &str, key: &str, value: &str) -> Result<String, CloudProviderError> {
        let mut url =
            Url::parse(base).map_err(|e| CloudProviderError::Config(format!("{base}: {e}")))?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url.into())
    }

    /// Wait for a Service Usage operation to finish.
    async fn wait_operation(&self, mut operation: Operation) -> Result<(), CloudProviderError> {
        let start = std::time::Instant::now();

        loop {
            if operation.done {
                return match operation.error {
                    Some(status) => Err(CloudProviderError::Operation {
                        name: operation.name,
                        message: format!("{} (code {})", status.message, status.code),
                    }),
                    None => Ok(()),
                };
            }

            if operation.name.is_empty() {
                return Err(CloudProviderError::Config(
                    "Pending operation has no name to poll".to_string(),
                ));
            }

            if start.elapsed() > self.operation_timeout {
                return Err(CloudProviderError::Timeout(self.operation_timeout.as_secs()));
            }

            tokio::time::sleep(self.poll_interval).await;

            debug!(
                operation = %operation.name,
                elapsed_secs = start.elapsed().as_secs(),
                "Polling operation"
            );

            let url = format!("{}/v1/{}", self.endpoints.service_usage, operation.name);
            operation = self.get(&url).await?;
        }
    }
}

#[async_trait]
impl KmsControlPlane for Gcp {
    async fn enable_service(
        &self,
        project: &str,
        service: &str,
    ) -> Result<(), CloudProviderError> {
        info!(project = %project, service = %service, "Enabling API");

        let url = format!(
            "{}/v1/projects/{project}/services/{service}:enable",
            self.endpoints.service_usage
        );
        let operation: Operation = self.post(&url, &Empty::default()).await?;
        self.wait_operation(operation).await?;

        info!(service = %service, "API enabled");
        Ok(())
    }

    async fn ensure_service_identity(
        &self,
        project: &str,
        service: &str,
    ) -> Result<(), CloudProviderError> {
        info!(project = %project, service = %service, "Provisioning service identity");

        if service == STORAGE_SERVICE {
            // Reading the Storage service account creates it on first access
            let url = format!(
                "{}/storage/v1/projects/{project}/serviceAccount",
                self.endpoints.storage
            );
            let account: StorageServiceAccount = self.get(&url).await?;
            info!(email = %account.email_address, "Storage service agent available");
            return Ok(());
        }

        let url = format!(
            "{}/v1beta1/projects/{project}/services/{service}:generateServiceIdentity",
            self.endpoints.service_usage
        );
        let operation: Operation = self.post(&url, &Empty::default()).await?;
        self.wait_operation(operation).await
    }

    async fn describe_project(&self, project: &str) -> Result<String, CloudProviderError> {
        let url = format!("{}/v1/projects/{project}", self.endpoints.resource_manager);
        let project: Project = self.get(&url).await?;

        debug!(
            project_id = %project.project_id,
            project_number = %project.project_number,
            state = ?project.lifecycle_state,
            "Project described"
        );
        Ok(project.project_number)
    }

    async fn create_key_ring(&self, key_ring: &KeyRingRef<'_>) -> Result<(), CloudProviderError> {
        info!(
            key_ring = %key_ring.name,
            location = %key_ring.location,
            "Creating key ring"
        );

        let base = format!(
            "{}/v1/projects/{}/locations/{}/keyRings",
            self.endpoints.kms, key_ring.project, key_ring.location
        );
        let url = Self::url_with_param(&base, "keyRingId", key_ring.name)?;
        let created: KeyRing = self.post(&url, &Empty::default()).await?;

        info!(name = %created.name, "Key ring created");
        Ok(())
    }

    async fn describe_key_ring(
        &self,
        key_ring: &KeyRingRef<'_>,
    ) -> Result<bool, CloudProviderError> {
        let url = format!("{}/v1/{}", self.endpoints.kms, key_ring.resource_name());
        self.exists::<KeyRing>(&url).await
    }

    async fn create_crypto_key(
        &self,
        key: &CryptoKeyRef<'_>,
        protection_level: ProtectionLevel,
    ) -> Result<(), CloudProviderError> {
        info!(
            key = %key.name,
            key_ring = %key.key_ring.name,
            protection_level = %protection_level,
            "Creating crypto key"
        );

        let base = format!(
            "{}/v1/{}/cryptoKeys",
            self.endpoints.kms,
            key.key_ring.resource_name()
        );
        let url = Self::url_with_param(&base, "cryptoKeyId", key.name)?;
        let body = CryptoKeyDefinition {
            purpose: "ENCRYPT_DECRYPT".to_string(),
            version_template: CryptoKeyVersionTemplate {
                protection_level: protection_level.api_value().to_string(),
                algorithm: "GOOGLE_SYMMETRIC_ENCRYPTION".to_string(),
            },
        };
        let created: CryptoKey = self.post(&url, &body).await?;

        info!(name = %created.name, "Crypto key created");
        Ok(())
    }

    async fn describe_crypto_key(
        &self,
        key: &CryptoKeyRef<'_>,
    ) -> Result<bool, CloudProviderError> {
        let url = format!("{}/v1/{}", self.endpoints.kms, key.resource_name());
        self.exists::<CryptoKey>(&url).await
    }

    async fn add_iam_policy_binding(
        &self,
        resource: &str,
        member: &str,
        role: &str,
    ) -> Result<(), CloudProviderError> {
        info!(resource = %resource, member = %member, role = %role, "Granting IAM binding");

        let url = format!("{}/v1/{resource}:getIamPolicy", self.endpoints.kms);
        let request = GetIamPolicyRequest {
            options: GetPolicyOptions {
                requested_policy_version: IAM_POLICY_VERSION,
            },
        };
        let mut policy: Policy = self.post(&url, &request).await?;

        if !policy.add_binding(member, role) {
            info!(member = %member, role = %role, "Binding already present");
            return Ok(());
        }

        let url = format!("{}/v1/{resource}:setIamPolicy", self.endpoints.kms);
        let _: Policy = self.post(&url, &SetIamPolicyRequest { policy }).await?;

        info!(member = %member, role = %role, "IAM binding granted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error_uses_envelope_message() {
        let body = r#"{"error": {"code": 409, "message": "KeyRing already exists.", "status": "ALREADY_EXISTS"}}"#;
        match Gcp::classify_error(StatusCode::CONFLICT, body) {
            CloudProviderError::AlreadyExists(message) => {
                assert_eq!(message, "KeyRing already exists.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_error_status_mapping() {
        assert!(matches!(
            Gcp::classify_error(StatusCode::NOT_FOUND, "gone"),
            CloudProviderError::NotFound(_)
        ));
        assert!(matches!(
            Gcp::classify_error(StatusCode::FORBIDDEN, "denied"),
            CloudProviderError::Auth(_)
        ));
        match Gcp::classify_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            CloudProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_url_with_param_encodes_value() {
        let url = Gcp::url_with_param(
            "https://cloudkms.googleapis.com/v1/projects/p/locations/europe/keyRings",
            "keyRingId",
            "my ring",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://cloudkms.googleapis.com/v1/projects/p/locations/europe/keyRings?keyRingId=my+ring"
        );
    }

    #[test]
    fn test_single_endpoint_trims_slash() {
        let endpoints = GcpEndpoints::single("http://127.0.0.1:8080/");
        assert_eq!(endpoints.kms, "http://127.0.0.1:8080");
        assert_eq!(endpoints.storage, "http://127.0.0.1:8080");
    }
}

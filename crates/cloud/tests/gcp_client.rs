//! Integration tests for the GCP control-plane client.
//!
//! These tests run the REST client against a wiremock server standing in
//! for Service Usage, Resource Manager, Cloud KMS and Cloud Storage.

use std::time::Duration;

use cmek_cloud::gcp::{Gcp, GcpEndpoints};
use cmek_cloud::{CloudProviderError, CryptoKeyRef, KeyRingRef, KmsControlPlane, ProtectionLevel};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLE: &str = "roles/cloudkms.cryptoKeyEncrypterDecrypter";
const MEMBER: &str = "serviceAccount:service-123456@gcp-sa-discoveryengine.iam.gserviceaccount.com";
const KEY_RESOURCE: &str = "projects/acme/locations/europe/keyRings/ring/cryptoKeys/key";

// =============================================================================
// Helpers
// =============================================================================

fn client(server: &MockServer) -> Gcp {
    Gcp::new("test-token")
        .unwrap()
        .with_endpoints(GcpEndpoints::single(&server.uri()))
        .with_operation_polling(Duration::from_millis(10), Duration::from_secs(5))
}

fn key_ring() -> KeyRingRef<'static> {
    KeyRingRef {
        project: "acme",
        location: "europe",
        name: "ring",
    }
}

fn crypto_key() -> CryptoKeyRef<'static> {
    CryptoKeyRef {
        key_ring: key_ring(),
        name: "key",
    }
}

// =============================================================================
// Service Usage
// =============================================================================

#[tokio::test]
async fn test_enable_service_completed_operation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/services/cloudkms.googleapis.com:enable"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/noop.DONE_OPERATION",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .enable_service("acme", "cloudkms.googleapis.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_enable_service_polls_pending_operation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/acme/services/discoveryengine.googleapis.com:enable",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/acf.p2-1",
            "done": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/operations/acf.p2-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/acf.p2-1",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .enable_service("acme", "discoveryengine.googleapis.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_enable_service_failed_operation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/services/cloudkms.googleapis.com:enable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/acf.p2-2",
            "done": true,
            "error": {"code": 9, "message": "Billing account required"}
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .enable_service("acme", "cloudkms.googleapis.com")
        .await;

    match result {
        Err(CloudProviderError::Operation { name, message }) => {
            assert_eq!(name, "operations/acf.p2-2");
            assert!(message.contains("Billing account required"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_enable_service_operation_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/services/cloudkms.googleapis.com:enable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/acf.p2-3",
            "done": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/operations/acf.p2-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/acf.p2-3",
            "done": false
        })))
        .mount(&server)
        .await;

    let gcp = client(&server)
        .with_operation_polling(Duration::from_millis(10), Duration::from_millis(100));
    let result = gcp.enable_service("acme", "cloudkms.googleapis.com").await;

    assert!(matches!(result, Err(CloudProviderError::Timeout(_))));
}

#[tokio::test]
async fn test_enable_service_pending_operation_without_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/services/cloudkms.googleapis.com:enable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "",
            "done": false
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .enable_service("acme", "cloudkms.googleapis.com")
        .await;

    assert!(matches!(result, Err(CloudProviderError::Config(_))));
}

#[tokio::test]
async fn test_enable_service_permission_denied() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/services/cloudkms.googleapis.com:enable"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .enable_service("acme", "cloudkms.googleapis.com")
        .await;
    assert!(matches!(result, Err(CloudProviderError::Auth(m)) if m == "Permission denied"));
}

#[tokio::test]
async fn test_generate_service_identity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1beta1/projects/acme/services/discoveryengine.googleapis.com:generateServiceIdentity",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/finished.DONE_OPERATION",
            "done": true,
            "response": {
                "email": "service-123456@gcp-sa-discoveryengine.iam.gserviceaccount.com"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .ensure_service_identity("acme", "discoveryengine.googleapis.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_storage_service_identity_uses_storage_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/projects/acme/serviceAccount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email_address": "service-123456@gs-project-accounts.iam.gserviceaccount.com",
            "kind": "storage#serviceAccount"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .ensure_service_identity("acme", "storage.googleapis.com")
        .await
        .unwrap();
}

// =============================================================================
// Resource Manager
// =============================================================================

#[tokio::test]
async fn test_describe_project_returns_number() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectId": "acme",
            "projectNumber": "123456",
            "lifecycleState": "ACTIVE"
        })))
        .mount(&server)
        .await;

    let number = client(&server).describe_project("acme").await.unwrap();
    assert_eq!(number, "123456");
}

// =============================================================================
// Cloud KMS
// =============================================================================

#[tokio::test]
async fn test_create_key_ring_conflict_is_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/acme/locations/europe/keyRings"))
        .and(query_param("keyRingId", "ring"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": 409,
                "message": "KeyRing projects/acme/locations/europe/keyRings/ring already exists.",
                "status": "ALREADY_EXISTS"
            }
        })))
        .mount(&server)
        .await;

    let result = client(&server).create_key_ring(&key_ring()).await;
    assert!(matches!(result, Err(CloudProviderError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_describe_key_ring_existence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/acme/locations/europe/keyRings/ring"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/acme/locations/europe/keyRings/ring",
            "createTime": "2024-05-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let gcp = client(&server);
    assert!(gcp.describe_key_ring(&key_ring()).await.unwrap());

    let missing = KeyRingRef {
        name: "missing",
        ..key_ring()
    };
    // Unmatched requests get a 404 from wiremock
    assert!(!gcp.describe_key_ring(&missing).await.unwrap());
}

#[tokio::test]
async fn test_create_crypto_key_request_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/acme/locations/europe/keyRings/ring/cryptoKeys",
        ))
        .and(query_param("cryptoKeyId", "key"))
        .and(body_partial_json(json!({
            "purpose": "ENCRYPT_DECRYPT",
            "versionTemplate": {
                "protectionLevel": "HSM",
                "algorithm": "GOOGLE_SYMMETRIC_ENCRYPTION"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": KEY_RESOURCE,
            "purpose": "ENCRYPT_DECRYPT"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .create_crypto_key(&crypto_key(), ProtectionLevel::Hsm)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_describe_crypto_key_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/{KEY_RESOURCE}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let result = client(&server).describe_crypto_key(&crypto_key()).await;
    assert!(matches!(
        result,
        Err(CloudProviderError::Api { status: 503, .. })
    ));
}

// =============================================================================
// IAM
// =============================================================================

#[tokio::test]
async fn test_add_iam_policy_binding_writes_new_member() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{KEY_RESOURCE}:getIamPolicy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 1,
            "etag": "BwYabc="
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{KEY_RESOURCE}:setIamPolicy")))
        .and(body_partial_json(json!({
            "policy": {
                "etag": "BwYabc=",
                "bindings": [{"role": ROLE, "members": [MEMBER]}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 1,
            "etag": "BwYdef=",
            "bindings": [{"role": ROLE, "members": [MEMBER]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_iam_policy_binding(KEY_RESOURCE, MEMBER, ROLE)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_iam_policy_binding_skips_existing_member() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{KEY_RESOURCE}:getIamPolicy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 1,
            "etag": "BwYabc=",
            "bindings": [{"role": ROLE, "members": [MEMBER]}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{KEY_RESOURCE}:setIamPolicy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    client(&server)
        .add_iam_policy_binding(KEY_RESOURCE, MEMBER, ROLE)
        .await
        .unwrap();
}

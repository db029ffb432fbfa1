//! Access token resolution.
//!
//! Tokens come from `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise from the
//! active `gcloud` credentials.

use tokio::process::Command;
use tracing::debug;

use crate::providers::CloudProviderError;

/// Environment variable holding a ready-made `OAuth2` access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Resolve an access token for the Google APIs.
///
/// # Errors
/// Returns [`CloudProviderError::Auth`] if no token is available.
pub async fn resolve_access_token() -> Result<String, CloudProviderError> {
    if let Some(token) = token_from_env(std::env::var(ACCESS_TOKEN_ENV).ok()) {
        debug!(source = ACCESS_TOKEN_ENV, "Using access token from environment");
        return Ok(token);
    }

    debug!(source = "gcloud", "Requesting access token from gcloud");

    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| CloudProviderError::Auth(format!("Failed to run gcloud: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CloudProviderError::Auth(format!(
            "gcloud auth print-access-token failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(CloudProviderError::Auth(
            "gcloud returned an empty access token; run `gcloud auth login`".to_string(),
        ));
    }

    Ok(token)
}

/// Accept an environment-provided token if it has content.
fn token_from_env(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

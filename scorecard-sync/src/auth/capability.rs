//! Capability checks against the external permission service
//!
//! The orchestrator asks one question: does this user hold the data-sync
//! capability. A definite "no" blocks the run; a failure of the
//! permission service itself does not, and the caller of this module
//! decides that policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability gating every sync and discovery run.
pub const SYNC_CAPABILITY: &str = "sync";

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Permission service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Permission service returned {status}: {body}")]
    Service { status: u16, body: String },
}

/// Boundary trait for the permission-and-role store.
#[async_trait]
pub trait CapabilityChecker: Send + Sync {
    /// Whether `user_id` holds `capability`. An `Err` means the service
    /// could not answer, which is distinct from a definite denial.
    async fn has_capability(
        &self,
        user_id: &str,
        capability: &str,
    ) -> Result<bool, CapabilityError>;
}

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    user_id: &'a str,
    capability: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
}

/// HTTP client for the permission service's check endpoint.
pub struct HttpCapabilityChecker {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCapabilityChecker {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CapabilityChecker for HttpCapabilityChecker {
    async fn has_capability(
        &self,
        user_id: &str,
        capability: &str,
    ) -> Result<bool, CapabilityError> {
        let url = format!("{}/api/permissions/check", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&CheckRequest {
                user_id,
                capability,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let check: CheckResponse = response.json().await?;
        Ok(check.allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_response_shape() {
        let allowed: CheckResponse = serde_json::from_str(r#"{"allowed": true}"#).unwrap();
        assert!(allowed.allowed);
        let denied: CheckResponse = serde_json::from_str(r#"{"allowed": false}"#).unwrap();
        assert!(!denied.allowed);
    }

    #[test]
    fn test_check_request_shape() {
        let body = serde_json::to_value(CheckRequest {
            user_id: "user-7",
            capability: SYNC_CAPABILITY,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"user_id": "user-7", "capability": "sync"})
        );
    }
}

//! Caller identity verification
//!
//! Callers present an HS256 bearer token minted by the session service.
//! Verification happens inside the sync pipeline rather than as router
//! middleware so request-shape validation can reject first, as the
//! protocol orders it.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Claims carried by a caller token.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallerClaims {
    /// Authenticated user id.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

/// Verifies caller bearer tokens against the shared session secret.
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Turn an `Authorization` header into an identity.
    ///
    /// Missing header, non-bearer scheme, bad signature, and expired
    /// tokens all map to the unauthorized family.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<CallerIdentity, SyncError> {
        let header = header
            .ok_or_else(|| SyncError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            SyncError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })?;

        let data = decode::<CallerClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| SyncError::Unauthorized(format!("Invalid bearer token: {}", e)))?;

        Ok(CallerIdentity {
            user_id: data.claims.sub,
        })
    }
}

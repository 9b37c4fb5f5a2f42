//! JWT token issuance and verification.
//!
//! Access and refresh tokens are signed with distinct secrets. Refresh
//! tokens carry a family identifier threaded through every rotation in a
//! lineage so a whole chain can be invalidated at once.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens.
    pub access_secret: String,
    /// Secret key for signing refresh tokens.
    pub refresh_secret: String,
    /// Issuer claim stamped into and required of every token.
    pub issuer: String,
    /// Access token expiration in minutes.
    pub access_token_expires_minutes: i64,
    /// Refresh token expiration in days.
    pub refresh_token_expires_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-access-secret".to_string(),
            refresh_secret: "change-me-refresh-secret".to_string(),
            issuer: "vantra".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 1,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed (configuration error).
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// Role ID, if the user has one assigned.
    pub role_id: Option<Uuid>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

impl AccessClaims {
    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Claims carried by refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Rotation family shared along a refresh lineage.
    pub family: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

impl RefreshClaims {
    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Result of issuing a token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Rotation family the refresh token belongs to.
    pub family: Uuid,
    /// When the access token expires.
    pub access_expires_at: DateTime<Utc>,
    /// When the refresh token expires.
    pub refresh_expires_at: DateTime<Utc>,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let access_encoding = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding = DecodingKey::from_secret(config.refresh_secret.as_bytes());
        Self {
            config,
            access_encoding,
            access_decoding,
            refresh_encoding,
            refresh_decoding,
        }
    }

    /// Issues an access/refresh token pair for a user.
    ///
    /// When `family` is `None` a fresh rotation family is started (login);
    /// otherwise the existing family is threaded through (refresh).
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role_id: Option<Uuid>,
        family: Option<Uuid>,
    ) -> Result<IssuedTokens, JwtError> {
        let now = Utc::now();
        let access_expires_at = now + Duration::minutes(self.config.access_token_expires_minutes);
        let refresh_expires_at = now + Duration::days(self.config.refresh_token_expires_days);
        let family = family.unwrap_or_else(Uuid::new_v4);

        let access_claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            role_id,
            iat: now.timestamp(),
            exp: access_expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };
        let refresh_claims = RefreshClaims {
            sub: user_id,
            family,
            iat: now.timestamp(),
            exp: refresh_expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            family,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Verifies and decodes an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed, the
    /// signature does not verify, or the issuer does not match.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(classify_error)
    }

    /// Verifies and decodes a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` for any other verification failure.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(classify_error)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_minutes * 60
    }
}

fn classify_error(e: jsonwebtoken::errors::Error) -> JwtError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::DecodingError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            issuer: "vantra-test".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 1,
        })
    }

    #[test]
    fn test_issue_pair_starts_fresh_family() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let first = service
            .issue_pair(user_id, "a@example.com", None, None)
            .unwrap();
        let second = service
            .issue_pair(user_id, "a@example.com", None, None)
            .unwrap();

        assert_ne!(first.family, second.family);
    }

    #[test]
    fn test_issue_pair_threads_existing_family() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let family = Uuid::new_v4();

        let issued = service
            .issue_pair(user_id, "a@example.com", None, Some(family))
            .unwrap();
        let claims = service.verify_refresh(&issued.refresh_token).unwrap();

        assert_eq!(issued.family, family);
        assert_eq!(claims.family, family);
        assert_eq!(claims.user_id(), user_id);
    }

    #[test]
    fn test_verify_access_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();

        let issued = service
            .issue_pair(user_id, "a@example.com", Some(role_id), None)
            .unwrap();
        let claims = service.verify_access(&issued.access_token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role_id, Some(role_id));
        assert_eq!(claims.iss, "vantra-test");
    }

    #[test]
    fn test_access_and_refresh_secrets_are_distinct() {
        let service = create_test_service();
        let issued = service
            .issue_pair(Uuid::new_v4(), "a@example.com", None, None)
            .unwrap();

        // A refresh token must not verify as an access token and vice versa.
        assert!(service.verify_access(&issued.refresh_token).is_err());
        assert!(service.verify_refresh(&issued.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_classified() {
        let service = JwtService::new(JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            issuer: "vantra-test".to_string(),
            access_token_expires_minutes: -5,
            refresh_token_expires_days: 1,
        });
        let issued = service
            .issue_pair(Uuid::new_v4(), "a@example.com", None, None)
            .unwrap();

        assert!(matches!(
            service.verify_access(&issued.access_token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            issuer: "someone-else".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 1,
        });
        let issued = other
            .issue_pair(Uuid::new_v4(), "a@example.com", None, None)
            .unwrap();

        assert!(matches!(
            service.verify_access(&issued.access_token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_malformed_token() {
        let service = create_test_service();
        assert!(matches!(
            service.verify_access("not.a.token"),
            Err(JwtError::DecodingError(_))
        ));
    }
}

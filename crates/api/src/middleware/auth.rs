//! Authorization gate for protected routes.
//!
//! Per request: `unauthenticated -> token-present -> token-verified ->
//! user-active check -> authorized`, exiting to rejected at any step.
//!
//! The gate re-validates the user's live status and password-change
//! invalidation on every request; expired access tokens are always
//! rejected, and silent refresh exists only at the explicit refresh
//! endpoint. The session touch is the only best-effort part of the path.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use vantra_core::permissions::PermissionSet;
use vantra_db::entities::users::UserStatus;
use vantra_db::{RoleRepository, SessionRepository, UserRepository};
use vantra_shared::JwtError;

use crate::AppState;

/// The resolved identity and permission context of an authenticated
/// request.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Authenticated user ID.
    pub user_id: Uuid,
    /// User email.
    pub email: String,
    /// Assigned role ID.
    pub role_id: Option<Uuid>,
    /// Assigned role name.
    pub role_name: Option<String>,
    /// Permission names resolved once for this request.
    pub permissions: PermissionSet,
    /// The presented access token (used to locate the session on logout).
    pub token: String,
}

impl Principal {
    /// True when the principal holds ANY of the listed permissions
    /// (logical OR). A principal with no role is always denied.
    #[must_use]
    pub fn has_any_permission(&self, required: &[&str]) -> bool {
        self.permissions.has_any(required)
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Authentication required"
                })),
            )
        })
    }
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Extracts the client IP and user agent from request headers.
#[must_use]
pub fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    (ip, user_agent)
}

/// Authorization gate middleware.
///
/// 1. Extracts the Bearer token (absence is distinct from invalidity)
/// 2. Verifies signature, issuer, and expiry
/// 3. Re-validates the user's live status and password-change invalidation
/// 4. Resolves the role's permission set once for the request
/// 5. Stores the `Principal` in request extensions and spawns the
///    best-effort session touch
#[allow(clippy::too_many_lines)]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    let claims = match state.jwt_service.verify_access(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => {
            // Distinguished so clients can attempt the refresh flow.
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "token_expired",
                    "message": "Token has expired"
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Invalid or malformed token"
                })),
            )
                .into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(claims.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Invalid or malformed token"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during authentication");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during authentication"
                })),
            )
                .into_response();
        }
    };

    if user.status != UserStatus::Active {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "account_inactive",
                "message": "This account is not active"
            })),
        )
            .into_response();
    }

    // Tokens issued before the last password change are dead.
    if let Some(changed_at) = user.password_changed_at {
        if changed_at.timestamp() > claims.iat {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "token_invalidated",
                    "message": "Token was invalidated by a password change"
                })),
            )
                .into_response();
        }
    }

    let (role_name, permissions) = match resolve_role(&state, user.role_id).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, "Database error resolving permissions");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during authentication"
                })),
            )
                .into_response();
        }
    };

    let principal = Principal {
        user_id: user.id,
        email: user.email,
        role_id: user.role_id,
        role_name,
        permissions,
        token: token.to_string(),
    };

    // Best-effort session touch: the request never waits on or fails
    // because of this write.
    let session_repo = SessionRepository::new((*state.db).clone());
    let touch_token = principal.token.clone();
    let touch_user = principal.user_id;
    tokio::spawn(async move {
        if let Err(e) = session_repo.touch(&touch_token, touch_user).await {
            warn!(error = %e, "Session touch failed");
        }
    });

    request.extensions_mut().insert(principal);
    next.run(request).await
}

async fn resolve_role(
    state: &AppState,
    role_id: Option<Uuid>,
) -> Result<(Option<String>, PermissionSet), sea_orm::DbErr> {
    let Some(role_id) = role_id else {
        return Ok((None, PermissionSet::new()));
    };

    let role_repo = RoleRepository::new((*state.db).clone());
    let role_name = role_repo.find_by_id(role_id).await?.map(|r| r.name);
    let permissions = role_repo
        .permissions_for(role_id)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    Ok((role_name, permissions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[test]
    fn test_client_meta_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        headers.insert("user-agent", "test-agent".parse().unwrap());

        let (ip, ua) = client_meta(&headers);
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(ua.as_deref(), Some("test-agent"));
    }

    #[test]
    fn test_client_meta_absent_headers() {
        let (ip, ua) = client_meta(&HeaderMap::new());
        assert!(ip.is_none());
        assert!(ua.is_none());
    }
}

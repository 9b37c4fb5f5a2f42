//! Authentication routes: login, register, token refresh, logout, profile,
//! and password change.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use vantra_core::auth::{hash_password, verify_password};
use vantra_core::lockout::{self, LockCheck};
use vantra_db::entities::login_history::LoginStatus;
use vantra_db::entities::users::UserStatus;
use vantra_db::repositories::NewActivityLog;
use vantra_db::{RefreshTokenRepository, RoleRepository, SessionRepository, UserRepository};
use vantra_shared::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, LogoutRequest, RefreshRequest,
    RegisterRequest, UserInfo,
};

use crate::AppState;
use crate::middleware::{Principal, client_meta};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh-token", post(refresh))
}

/// Creates the auth routes that sit behind the authorization gate.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/check-session", get(check_session))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
        .route("/auth/login-history", get(login_history))
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

fn invalid_credentials() -> Response {
    // Whether the email exists is never distinguished in the response.
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid email or password"
        })),
    )
        .into_response()
}

fn account_locked(locked_until: chrono::DateTime<chrono::Utc>) -> Response {
    (
        StatusCode::LOCKED,
        Json(json!({
            "error": "account_locked",
            "message": "Account is temporarily locked after repeated failed logins",
            "locked_until": locked_until
        })),
    )
        .into_response()
}

/// Resolves a user's role name and permission names.
async fn resolve_role_context(
    state: &AppState,
    role_id: Option<Uuid>,
) -> Result<(Option<String>, Vec<String>), sea_orm::DbErr> {
    let Some(role_id) = role_id else {
        return Ok((None, Vec::new()));
    };
    let role_repo = RoleRepository::new((*state.db).clone());
    let role_name = role_repo.find_by_id(role_id).await?.map(|r| r.name);
    let mut permissions: Vec<String> = role_repo
        .permissions_for(role_id)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    permissions.sort();
    Ok((role_name, permissions))
}

/// POST /auth/login - Authenticate and return a token pair.
#[allow(clippy::too_many_lines)]
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);
    let user_repo = UserRepository::new((*state.db).clone());

    let mut user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            state
                .audit
                .record_login(
                    None,
                    ip.as_deref(),
                    user_agent.as_deref(),
                    LoginStatus::Failed,
                    Some("unknown_email"),
                )
                .await;
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login");
        }
    };

    // Lockout check-and-heal happens before any credential comparison.
    match lockout::check_lock(
        user.status == UserStatus::Suspended,
        user.locked_until,
        chrono::Utc::now(),
    ) {
        LockCheck::Locked { until } => {
            state
                .audit
                .record_login(
                    Some(user.id),
                    ip.as_deref(),
                    user_agent.as_deref(),
                    LoginStatus::Failed,
                    Some("account_locked"),
                )
                .await;
            return account_locked(until);
        }
        LockCheck::LockExpired => {
            if let Err(e) = user_repo.reset_lockout(user.id).await {
                error!(error = %e, "Database error healing lockout");
                return internal_error("An error occurred during login");
            }
            user.status = UserStatus::Active;
            user.failed_login_attempts = 0;
            user.locked_until = None;
        }
        LockCheck::NotLocked => {}
    }

    // Admin-suspended (no locked_until) and inactive accounts stop here.
    if user.status != UserStatus::Active {
        state
            .audit
            .record_login(
                Some(user.id),
                ip.as_deref(),
                user_agent.as_deref(),
                LoginStatus::Failed,
                Some("account_inactive"),
            )
            .await;
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "account_inactive",
                "message": "This account is not active"
            })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            let outcome = match user_repo
                .record_failed_login(&user, &state.lockout_policy())
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Database error recording failed login");
                    return internal_error("An error occurred during login");
                }
            };
            state
                .audit
                .record_login(
                    Some(user.id),
                    ip.as_deref(),
                    user_agent.as_deref(),
                    LoginStatus::Failed,
                    Some("invalid_password"),
                )
                .await;

            if let Some(until) = outcome.locked_until {
                warn!(user_id = %user.id, attempts = outcome.attempts, "Account locked");
                let mut entry = NewActivityLog::new("account_locked");
                entry.user_id = Some(user.id);
                entry.module = Some("auth".to_string());
                entry.description =
                    Some(format!("Locked after {} failed attempts", outcome.attempts));
                entry.ip_address = ip.clone();
                entry.user_agent = user_agent.clone();
                state.audit.record_detached(entry);
                return account_locked(until);
            }
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during login");
        }
    }

    // Successful login always resets the failure counter.
    if let Err(e) = user_repo.record_successful_login(user.id, ip.as_deref()).await {
        error!(error = %e, "Database error recording login");
        return internal_error("An error occurred during login");
    }

    let issued = match state
        .jwt_service
        .issue_pair(user.id, &user.email, user.role_id, None)
    {
        Ok(issued) => issued,
        Err(e) => {
            error!(error = %e, "Failed to issue token pair");
            return internal_error("An error occurred during login");
        }
    };

    let refresh_repo = RefreshTokenRepository::new((*state.db).clone());
    if let Err(e) = refresh_repo
        .create(
            user.id,
            &issued.refresh_token,
            issued.family,
            issued.refresh_expires_at,
        )
        .await
    {
        error!(error = %e, "Failed to persist refresh token");
        return internal_error("An error occurred during login");
    }

    let session_repo = SessionRepository::new((*state.db).clone());
    if let Err(e) = session_repo
        .open(
            user.id,
            &issued.access_token,
            ip.as_deref(),
            user_agent.as_deref(),
            state.session_expires_at(),
        )
        .await
    {
        error!(error = %e, "Failed to open session");
        return internal_error("An error occurred during login");
    }

    let (role_name, permissions) = match resolve_role_context(&state, user.role_id).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, "Database error resolving role");
            return internal_error("An error occurred during login");
        }
    };

    state
        .audit
        .record_login(
            Some(user.id),
            ip.as_deref(),
            user_agent.as_deref(),
            LoginStatus::Success,
            None,
        )
        .await;
    info!(user_id = %user.id, "User logged in");

    let response = LoginResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: role_name,
            permissions,
        },
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// POST /auth/register - Register a new user.
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);
    let user_repo = UserRepository::new((*state.db).clone());

    if payload.password.len() < state.password.min_length {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "password_too_short",
                "message": format!(
                    "Password must be at least {} characters",
                    state.password.min_length
                )
            })),
        )
            .into_response();
    }

    match user_repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return internal_error("An error occurred during registration");
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred during registration");
        }
    };

    let user = match user_repo
        .create(
            &payload.email,
            &password_hash,
            &payload.first_name,
            &payload.last_name,
            payload.phone.as_deref(),
            payload.role_id,
        )
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return internal_error("An error occurred during registration");
        }
    };

    info!(user_id = %user.id, email = %user.email, "New user registered");

    let mut entry = NewActivityLog::new("register");
    entry.user_id = Some(user.id);
    entry.module = Some("auth".to_string());
    entry.entity = Some("user".to_string());
    entry.entity_id = Some(user.id.to_string());
    entry.ip_address = ip;
    entry.user_agent = user_agent;
    state.audit.record_detached(entry);

    (
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "user": {
                "id": user.id,
                "email": user.email,
                "first_name": user.first_name,
                "last_name": user.last_name
            }
        })),
    )
        .into_response()
}

/// POST /auth/refresh-token - Rotate a refresh token.
///
/// Revoke-then-create within the same family; a reused (already revoked)
/// token is rejected.
#[allow(clippy::too_many_lines)]
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);

    let claims = match state.jwt_service.verify_refresh(&payload.refresh_token) {
        Ok(c) => c,
        Err(vantra_shared::JwtError::Expired) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "refresh_token_expired",
                    "message": "Refresh token has expired"
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_refresh_token",
                    "message": "Invalid refresh token"
                })),
            )
                .into_response();
        }
    };

    let refresh_repo = RefreshTokenRepository::new((*state.db).clone());
    let stored = match refresh_repo.find_by_token(&payload.refresh_token).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_refresh_token",
                    "message": "Invalid refresh token"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during token refresh");
            return internal_error("An error occurred during token refresh");
        }
    };

    if stored.is_revoked
        || stored.expires_at <= chrono::Utc::now()
        || stored.user_id != claims.user_id()
    {
        warn!(user_id = %stored.user_id, family = %stored.family, "Rejected revoked or expired refresh token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "refresh_token_revoked",
                "message": "Refresh token has been revoked or expired"
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(stored.user_id).await {
        Ok(Some(u)) if u.status == UserStatus::Active => u,
        Ok(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "account_inactive",
                    "message": "This account is not active"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during token refresh");
            return internal_error("An error occurred during token refresh");
        }
    };

    // Rotation: revoke the presented token, then issue its successor in
    // the same family. A crash between the steps forces one re-login.
    if let Err(e) = refresh_repo.revoke(stored.id).await {
        error!(error = %e, "Failed to revoke refresh token");
        return internal_error("An error occurred during token refresh");
    }

    let issued = match state
        .jwt_service
        .issue_pair(user.id, &user.email, user.role_id, Some(stored.family))
    {
        Ok(issued) => issued,
        Err(e) => {
            error!(error = %e, "Failed to issue token pair");
            return internal_error("An error occurred during token refresh");
        }
    };

    if let Err(e) = refresh_repo
        .create(
            user.id,
            &issued.refresh_token,
            issued.family,
            issued.refresh_expires_at,
        )
        .await
    {
        error!(error = %e, "Failed to persist refresh token");
        return internal_error("An error occurred during token refresh");
    }

    // Each issued access token gets its own session row.
    let session_repo = SessionRepository::new((*state.db).clone());
    if let Err(e) = session_repo
        .open(
            user.id,
            &issued.access_token,
            ip.as_deref(),
            user_agent.as_deref(),
            state.session_expires_at(),
        )
        .await
    {
        error!(error = %e, "Failed to open session");
        return internal_error("An error occurred during token refresh");
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": issued.access_token,
            "refresh_token": issued.refresh_token,
            "expires_in": state.jwt_service.access_token_expires_in()
        })),
    )
        .into_response()
}

/// GET /auth/check-session - Lightweight validity poll.
async fn check_session(principal: Principal) -> impl IntoResponse {
    Json(json!({
        "valid": true,
        "user_id": principal.user_id
    }))
}

/// POST /auth/logout - Close the presenting session and revoke its
/// refresh token family.
async fn logout(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);
    let session_repo = SessionRepository::new((*state.db).clone());

    if let Err(e) = session_repo
        .close_by_token(&principal.token, principal.user_id)
        .await
    {
        error!(error = %e, "Failed to close session");
        return internal_error("An error occurred during logout");
    }

    // Revoke the refresh lineage when the client presents it.
    if let Some(refresh_token) = payload.and_then(|Json(p)| p.refresh_token) {
        if let Ok(claims) = state.jwt_service.verify_refresh(&refresh_token) {
            if claims.user_id() == principal.user_id {
                let refresh_repo = RefreshTokenRepository::new((*state.db).clone());
                if let Err(e) = refresh_repo.revoke_family(claims.family).await {
                    warn!(error = %e, "Failed to revoke refresh token family");
                }
            }
        }
    }

    state
        .audit
        .record_logout(principal.user_id, ip.as_deref(), user_agent.as_deref())
        .await;
    info!(user_id = %principal.user_id, "User logged out");

    Json(json!({ "status": true })).into_response()
}

/// POST /auth/logout-all - Terminate every session and revoke every
/// refresh token for the caller.
async fn logout_all(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);
    let session_repo = SessionRepository::new((*state.db).clone());
    let refresh_repo = RefreshTokenRepository::new((*state.db).clone());

    let sessions_closed = match session_repo.terminate_all(principal.user_id, None).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to terminate sessions");
            return internal_error("An error occurred during logout");
        }
    };
    let tokens_revoked = match refresh_repo.revoke_all_for_user(principal.user_id).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to revoke refresh tokens");
            return internal_error("An error occurred during logout");
        }
    };

    state
        .audit
        .record_logout(principal.user_id, ip.as_deref(), user_agent.as_deref())
        .await;
    info!(
        user_id = %principal.user_id,
        sessions_closed,
        tokens_revoked,
        "User logged out everywhere"
    );

    Json(json!({
        "status": true,
        "sessions_closed": sessions_closed,
        "tokens_revoked": tokens_revoked
    }))
    .into_response()
}

/// GET /auth/me - Profile with role and permission names.
async fn me(State(state): State<AppState>, principal: Principal) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(principal.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "User not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error loading profile");
            return internal_error("An error occurred loading the profile");
        }
    };

    Json(json!({
        "status": true,
        "user": {
            "id": user.id,
            "email": user.email,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "phone": user.phone,
            "status": user.status,
            "role": principal.role_name,
            "permissions": principal.permissions.to_sorted_vec(),
            "last_login_at": user.last_login_at,
            "created_at": user.created_at
        }
    }))
    .into_response()
}

/// POST /auth/change-password - Rotate the password.
///
/// Stamps `password_changed_at` so outstanding access tokens die at the
/// authorization gate, and revokes all refresh tokens.
async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    let (ip, user_agent) = client_meta(&headers);
    let user_repo = UserRepository::new((*state.db).clone());

    if payload.new_password.len() < state.password.min_length {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "password_too_short",
                "message": format!(
                    "Password must be at least {} characters",
                    state.password.min_length
                )
            })),
        )
            .into_response();
    }

    let user = match user_repo.find_by_id(principal.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "User not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during password change");
            return internal_error("An error occurred changing the password");
        }
    };

    match verify_password(&payload.current_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Current password is incorrect"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred changing the password");
        }
    }

    let new_hash = match hash_password(&payload.new_password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred changing the password");
        }
    };

    if let Err(e) = user_repo.update_password(principal.user_id, &new_hash).await {
        error!(error = %e, "Failed to update password");
        return internal_error("An error occurred changing the password");
    }

    let refresh_repo = RefreshTokenRepository::new((*state.db).clone());
    if let Err(e) = refresh_repo.revoke_all_for_user(principal.user_id).await {
        warn!(error = %e, "Failed to revoke refresh tokens after password change");
    }

    state
        .audit
        .record_password_change(principal.user_id, ip.as_deref(), user_agent.as_deref())
        .await;
    info!(user_id = %principal.user_id, "Password changed");

    Json(json!({ "status": true })).into_response()
}

/// GET /auth/login-history - The caller's recent login attempts.
async fn login_history(State(state): State<AppState>, principal: Principal) -> impl IntoResponse {
    let history_repo = vantra_db::LoginHistoryRepository::new((*state.db).clone());
    match history_repo.recent(principal.user_id, 20).await {
        Ok(rows) => Json(json!({
            "status": true,
            "data": rows
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Database error loading login history");
            internal_error("An error occurred loading login history")
        }
    }
}

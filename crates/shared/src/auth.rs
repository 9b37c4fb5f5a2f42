//! Authentication request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional role to assign at creation.
    pub role_id: Option<Uuid>,
}

/// Token refresh request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token to rotate.
    pub refresh_token: String,
}

/// Logout request payload.
///
/// The refresh token is optional; when present its whole rotation family is
/// revoked alongside the presenting session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token whose family should be revoked.
    pub refresh_token: Option<String>,
}

/// Password change request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub current_password: String,
    /// New password.
    pub new_password: String,
}

/// Admin user update request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New account status (`active`, `suspended`, `inactive`).
    pub status: Option<String>,
    /// New role assignment.
    pub role_id: Option<Uuid>,
}

/// Role creation request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleRequest {
    /// Unique role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Permissions to grant, by ID.
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

/// Role update request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement permission set, by ID.
    pub permission_ids: Option<Vec<Uuid>>,
}

/// User identity returned by login and profile endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Role name, if assigned.
    pub role: Option<String>,
    /// Permission names held through the role.
    pub permissions: Vec<String>,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// The authenticated user.
    pub user: UserInfo,
    /// Short-lived access token.
    pub access_token: String,
    /// Rotating refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

//! Admin user management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use vantra_db::UserRepository;
use vantra_db::entities::users::{self, UserStatus};
use vantra_db::repositories::{NewActivityLog, UserChanges, UserListFilter};
use vantra_shared::auth::UpdateUserRequest;
use vantra_shared::pagination::{PageRequest, PageResponse};

use crate::AppState;
use crate::middleware::Principal;

/// Creates the user management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/users", get(list_users))
        .route("/auth/users/{user_id}", put(update_user))
}

/// Query parameters for the user listing.
#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    search: Option<String>,
    status: Option<String>,
    role_id: Option<Uuid>,
    page: Option<u32>,
    per_page: Option<u32>,
}

impl ListUsersQuery {
    fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": "You do not have permission to perform this action"
        })),
    )
        .into_response()
}

fn parse_status(value: &str) -> Option<UserStatus> {
    match value {
        "active" => Some(UserStatus::Active),
        "suspended" => Some(UserStatus::Suspended),
        "inactive" => Some(UserStatus::Inactive),
        _ => None,
    }
}

fn user_summary(user: &users::Model) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "phone": user.phone,
        "status": user.status,
        "role_id": user.role_id,
        "failed_login_attempts": user.failed_login_attempts,
        "locked_until": user.locked_until,
        "last_login_at": user.last_login_at,
        "created_at": user.created_at,
        "updated_at": user.updated_at
    })
}

/// GET /auth/users - Paginated user listing with search and filters.
async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListUsersQuery>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["users.view"]) {
        return forbidden();
    }

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match parse_status(raw) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_status",
                        "message": "Status must be one of: active, suspended, inactive"
                    })),
                )
                    .into_response();
            }
        },
    };

    let page = query.page_request();
    let filter = UserListFilter {
        search: query.search,
        status,
        role_id: query.role_id,
    };
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.list(&filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(user_summary).collect();
            Json(PageResponse::new(data, page.page, page.per_page, total)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing users");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred listing users"
                })),
            )
                .into_response()
        }
    }
}

/// PUT /auth/users/{user_id} - Update a user's profile fields, status,
/// or role assignment.
///
/// Records old/new snapshots in the audit log. Setting status to
/// `suspended` here never sets `locked_until`, so the suspension holds
/// until an admin lifts it.
async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["users.update"]) {
        return forbidden();
    }

    let status = match payload.status.as_deref() {
        None => None,
        Some(raw) => match parse_status(raw) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_status",
                        "message": "Status must be one of: active, suspended, inactive"
                    })),
                )
                    .into_response();
            }
        },
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let before = match user_repo.find_by_id(user_id).await {
        Ok(Some(user)) => user,
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
            error!(error = %e, "Database error loading user");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred updating the user"
                })),
            )
                .into_response();
        }
    };

    let changes = UserChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        status,
        role_id: payload.role_id.map(Some),
    };

    let after = match user_repo.update(user_id, changes).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Database error updating user");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred updating the user"
                })),
            )
                .into_response();
        }
    };

    info!(admin = %principal.user_id, %user_id, "User updated");

    let mut entry = NewActivityLog::new("update");
    entry.user_id = Some(principal.user_id);
    entry.module = Some("users".to_string());
    entry.entity = Some("user".to_string());
    entry.entity_id = Some(user_id.to_string());
    entry.old_values = Some(user_summary(&before));
    entry.new_values = Some(user_summary(&after));
    state.audit.record_detached(entry);

    Json(json!({ "status": true, "user": user_summary(&after) })).into_response()
}

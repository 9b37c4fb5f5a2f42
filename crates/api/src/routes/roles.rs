//! Role and permission-catalog management routes.

use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use vantra_db::entities::{permissions, roles};
use vantra_db::repositories::NewActivityLog;
use vantra_db::{PermissionRepository, RoleRepository};
use vantra_shared::auth::{CreateRoleRequest, UpdateRoleRequest};

use crate::AppState;
use crate::middleware::Principal;

/// Creates the role management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/roles", get(list_roles).post(create_role))
        .route("/auth/roles/{role_id}", put(update_role).delete(delete_role))
        .route("/auth/permissions", get(list_permissions))
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

fn permission_json(p: &permissions::Model) -> serde_json::Value {
    json!({
        "id": p.id,
        "name": p.name,
        "module": p.module,
        "action": p.action,
        "description": p.description
    })
}

fn role_json(role: &roles::Model, permissions: &[permissions::Model]) -> serde_json::Value {
    json!({
        "id": role.id,
        "name": role.name,
        "description": role.description,
        "is_system": role.is_system,
        "permissions": permissions.iter().map(permission_json).collect::<Vec<_>>(),
        "created_at": role.created_at,
        "updated_at": role.updated_at
    })
}

/// Validates that every referenced permission ID exists in the catalog.
///
/// Duplicate IDs in the payload count once.
async fn validate_permission_ids(
    state: &AppState,
    ids: &[Uuid],
) -> Result<bool, sea_orm::DbErr> {
    let unique: HashSet<Uuid> = ids.iter().copied().collect();
    let found = PermissionRepository::new((*state.db).clone())
        .find_by_ids(ids)
        .await?;
    Ok(found.len() == unique.len())
}

/// GET /auth/roles - All roles with their permission sets.
async fn list_roles(State(state): State<AppState>, principal: Principal) -> impl IntoResponse {
    if !principal.has_any_permission(&["roles.view"]) {
        return forbidden();
    }

    let role_repo = RoleRepository::new((*state.db).clone());
    match role_repo.list_with_permissions().await {
        Ok(rows) => {
            let data: Vec<_> = rows
                .iter()
                .map(|(role, perms)| role_json(role, perms))
                .collect();
            Json(json!({ "status": true, "data": data })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing roles");
            internal_error("An error occurred listing roles")
        }
    }
}

/// POST /auth/roles - Create a role with an initial permission set.
async fn create_role(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["roles.create"]) {
        return forbidden();
    }

    let role_repo = RoleRepository::new((*state.db).clone());

    match role_repo.find_by_name(&payload.name).await {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "role_exists",
                    "message": "A role with this name already exists"
                })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Database error checking role name");
            return internal_error("An error occurred creating the role");
        }
    }

    match validate_permission_ids(&state, &payload.permission_ids).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "unknown_permission",
                    "message": "One or more permission IDs do not exist"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error validating permissions");
            return internal_error("An error occurred creating the role");
        }
    }

    let role = match role_repo
        .create(
            &payload.name,
            payload.description.as_deref(),
            &payload.permission_ids,
        )
        .await
    {
        Ok(role) => role,
        Err(e) => {
            error!(error = %e, "Database error creating role");
            return internal_error("An error occurred creating the role");
        }
    };

    info!(admin = %principal.user_id, role_id = %role.id, name = %role.name, "Role created");

    let mut entry = NewActivityLog::new("create");
    entry.user_id = Some(principal.user_id);
    entry.module = Some("roles".to_string());
    entry.entity = Some("role".to_string());
    entry.entity_id = Some(role.id.to_string());
    entry.new_values = Some(json!({
        "name": role.name,
        "description": role.description,
        "permission_ids": payload.permission_ids
    }));
    state.audit.record_detached(entry);

    let perms = role_repo.permissions_for(role.id).await.unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(json!({ "status": true, "role": role_json(&role, &perms) })),
    )
        .into_response()
}

/// PUT /auth/roles/{role_id} - Update a role's fields or replace its
/// permission set. System roles are immutable.
async fn update_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["roles.update"]) {
        return forbidden();
    }

    let role_repo = RoleRepository::new((*state.db).clone());
    let before = match role_repo.find_by_id(role_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Role not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error loading role");
            return internal_error("An error occurred updating the role");
        }
    };

    if before.is_system {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "system_role",
                "message": "System roles cannot be modified"
            })),
        )
            .into_response();
    }

    if let Some(ids) = &payload.permission_ids {
        match validate_permission_ids(&state, ids).await {
            Ok(true) => {}
            Ok(false) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "unknown_permission",
                        "message": "One or more permission IDs do not exist"
                    })),
                )
                    .into_response();
            }
            Err(e) => {
                error!(error = %e, "Database error validating permissions");
                return internal_error("An error occurred updating the role");
            }
        }
    }

    let role = match role_repo
        .update(
            role_id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.permission_ids.as_deref(),
        )
        .await
    {
        Ok(role) => role,
        Err(e) => {
            error!(error = %e, "Database error updating role");
            return internal_error("An error occurred updating the role");
        }
    };

    info!(admin = %principal.user_id, %role_id, "Role updated");

    let mut entry = NewActivityLog::new("update");
    entry.user_id = Some(principal.user_id);
    entry.module = Some("roles".to_string());
    entry.entity = Some("role".to_string());
    entry.entity_id = Some(role_id.to_string());
    entry.old_values = Some(json!({
        "name": before.name,
        "description": before.description
    }));
    entry.new_values = Some(json!({
        "name": role.name,
        "description": role.description,
        "permission_ids": payload.permission_ids
    }));
    state.audit.record_detached(entry);

    let perms = role_repo.permissions_for(role_id).await.unwrap_or_default();
    Json(json!({ "status": true, "role": role_json(&role, &perms) })).into_response()
}

/// DELETE /auth/roles/{role_id} - Delete a non-system role.
async fn delete_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(role_id): Path<Uuid>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["roles.delete"]) {
        return forbidden();
    }

    let role_repo = RoleRepository::new((*state.db).clone());
    let role = match role_repo.find_by_id(role_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Role not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error loading role");
            return internal_error("An error occurred deleting the role");
        }
    };

    if role.is_system {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "system_role",
                "message": "System roles cannot be deleted"
            })),
        )
            .into_response();
    }

    match role_repo.assigned_user_count(role_id).await {
        Ok(0) => {}
        Ok(count) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "role_in_use",
                    "message": format!("Role is still assigned to {count} user(s)")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error counting role assignments");
            return internal_error("An error occurred deleting the role");
        }
    }

    if let Err(e) = role_repo.delete(role_id).await {
        error!(error = %e, "Database error deleting role");
        return internal_error("An error occurred deleting the role");
    }

    info!(admin = %principal.user_id, %role_id, name = %role.name, "Role deleted");

    let mut entry = NewActivityLog::new("delete");
    entry.user_id = Some(principal.user_id);
    entry.module = Some("roles".to_string());
    entry.entity = Some("role".to_string());
    entry.entity_id = Some(role_id.to_string());
    entry.old_values = Some(json!({
        "name": role.name,
        "description": role.description
    }));
    state.audit.record_detached(entry);

    Json(json!({ "status": true })).into_response()
}

/// GET /auth/permissions - The seeded permission catalog.
async fn list_permissions(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["roles.view"]) {
        return forbidden();
    }

    let permission_repo = PermissionRepository::new((*state.db).clone());
    match permission_repo.list_all().await {
        Ok(perms) => {
            let data: Vec<_> = perms.iter().map(permission_json).collect();
            Json(json!({ "status": true, "data": data })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing permissions");
            internal_error("An error occurred listing permissions")
        }
    }
}

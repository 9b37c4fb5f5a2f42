//! Session visibility and termination routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use vantra_db::SessionRepository;

use crate::AppState;
use crate::middleware::Principal;

/// Creates the session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/{session_id}", delete(terminate_session))
}

/// GET /auth/sessions - The caller's active sessions, most recent
/// activity first.
async fn list_sessions(State(state): State<AppState>, principal: Principal) -> impl IntoResponse {
    let session_repo = SessionRepository::new((*state.db).clone());
    match session_repo.list_active(principal.user_id).await {
        Ok(sessions) => {
            let data: Vec<_> = sessions
                .into_iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "ip_address": s.ip_address,
                        "user_agent": s.user_agent,
                        "created_at": s.created_at,
                        "last_activity_at": s.last_activity_at,
                        "expires_at": s.expires_at
                    })
                })
                .collect();
            Json(json!({ "status": true, "data": data })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing sessions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred listing sessions"
                })),
            )
                .into_response()
        }
    }
}

/// DELETE /auth/sessions/{session_id} - Remotely terminate one of the
/// caller's own sessions.
///
/// Ownership-scoped: another user's session ID yields the same 404 as a
/// non-existent one.
async fn terminate_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    let session_repo = SessionRepository::new((*state.db).clone());
    match session_repo.terminate(session_id, principal.user_id).await {
        Ok(true) => {
            info!(user_id = %principal.user_id, %session_id, "Session terminated");
            Json(json!({ "status": true })).into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Session not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error terminating session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred terminating the session"
                })),
            )
                .into_response()
        }
    }
}

//! Activity log query routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use vantra_db::ActivityLogRepository;
use vantra_db::entities::{activity_logs, users};
use vantra_db::repositories::ActivityLogFilter;
use vantra_shared::pagination::{PageRequest, PageResponse};

use crate::AppState;
use crate::middleware::Principal;

/// Creates the activity log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/activity-logs", get(query_logs))
}

/// Query parameters for the activity log listing.
#[derive(Debug, Deserialize)]
struct LogsQuery {
    user_id: Option<Uuid>,
    action: Option<String>,
    module: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    page: Option<u32>,
    per_page: Option<u32>,
}

fn log_json(row: &activity_logs::Model, user: Option<&users::Model>) -> serde_json::Value {
    json!({
        "id": row.id,
        "user_id": row.user_id,
        "user_name": user.map(|u| format!("{} {}", u.first_name, u.last_name)),
        "user_email": user.map(|u| u.email.clone()),
        "action": row.action,
        "module": row.module,
        "entity": row.entity,
        "entity_id": row.entity_id,
        "description": row.description,
        "old_values": row.old_values,
        "new_values": row.new_values,
        "ip_address": row.ip_address,
        "user_agent": row.user_agent,
        "status": row.status,
        "error_message": row.error_message,
        "created_at": row.created_at
    })
}

/// GET /auth/activity-logs - Filtered, paginated audit trail, most
/// recent first.
async fn query_logs(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    if !principal.has_any_permission(&["activity_logs.view"]) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "You do not have permission to perform this action"
            })),
        )
            .into_response();
    }

    let filter = ActivityLogFilter {
        user_id: query.user_id,
        action: query.action,
        module: query.module,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let default = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(default.page),
        per_page: query.per_page.unwrap_or(default.per_page),
    };

    let log_repo = ActivityLogRepository::new((*state.db).clone());
    match log_repo.query(&filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows
                .iter()
                .map(|(row, user)| log_json(row, user.as_ref()))
                .collect();
            Json(PageResponse::new(data, page.page, page.per_page, total)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error querying activity logs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred querying activity logs"
                })),
            )
                .into_response()
        }
    }
}

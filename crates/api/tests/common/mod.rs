//! Shared setup for full-router integration tests.
//!
//! Each test builds the real router over its own in-memory SQLite
//! database with migrations applied, and drives it with `oneshot`
//! requests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use vantra_api::services::{AuditService, EventBus};
use vantra_api::{AppState, create_router};
use vantra_db::RoleRepository;
use vantra_db::migration::Migrator;
use vantra_shared::config::{PasswordConfig, RealtimeConfig, SecurityConfig};
use vantra_shared::{JwtConfig, JwtService};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        issuer: "vantra-test".to_string(),
        access_token_expires_minutes: 15,
        refresh_token_expires_days: 1,
    }
}

pub async fn test_state() -> AppState {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let events = EventBus::new(16);
    let audit = AuditService::new(db.clone(), events.clone());

    AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(test_jwt_config())),
        audit: Arc::new(audit),
        events,
        password: PasswordConfig::default(),
        security: SecurityConfig::default(),
        realtime: RealtimeConfig::default(),
    }
}

pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (create_router(state.clone()), state)
}

/// Sends one request and returns the status plus parsed JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers a user (optionally with a named seeded role) and returns
/// its email.
pub async fn register_user(app: &Router, state: &AppState, role_name: Option<&str>) -> String {
    let role_id = match role_name {
        Some(name) => {
            let repo = RoleRepository::new((*state.db).clone());
            Some(
                repo.find_by_name(name)
                    .await
                    .unwrap()
                    .expect("seeded role exists")
                    .id,
            )
        }
        None => None,
    };

    let email = format!("user-{}@example.com", Uuid::new_v4());
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": TEST_PASSWORD,
            "first_name": "Test",
            "last_name": "User",
            "role_id": role_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    email
}

/// Logs in and returns `(access_token, refresh_token)`.
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

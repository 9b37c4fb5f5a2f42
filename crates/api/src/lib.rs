//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for authentication, sessions, users, roles, and the
//!   activity log
//! - The authorization gate middleware
//! - The audit service and realtime event bus

pub mod middleware;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vantra_core::lockout::LockoutPolicy;
use vantra_shared::JwtService;
use vantra_shared::config::{PasswordConfig, RealtimeConfig, SecurityConfig};

use services::{AuditService, EventBus};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Audit log service.
    pub audit: Arc<AuditService>,
    /// Realtime event bus.
    pub events: EventBus,
    /// Password policy.
    pub password: PasswordConfig,
    /// Lockout and session settings.
    pub security: SecurityConfig,
    /// Realtime stream settings.
    pub realtime: RealtimeConfig,
}

impl AppState {
    /// Returns the lockout policy derived from configuration.
    #[must_use]
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: self.security.max_failed_attempts,
            lockout_duration: chrono::Duration::minutes(self.security.lockout_minutes),
        }
    }

    /// Returns the expiry instant for a session opened now.
    #[must_use]
    pub fn session_expires_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now() + chrono::Duration::hours(self.security.session_timeout_hours)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

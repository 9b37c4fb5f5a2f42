//! Vantra API Server
//!
//! Main entry point for the Vantra HR authentication backend.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vantra_api::{AppState, create_router};
use vantra_api::services::{AuditService, EventBus};
use vantra_db::connect;
use vantra_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vantra=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        access_secret: config.jwt.access_secret.clone(),
        refresh_secret: config.jwt.refresh_secret.clone(),
        issuer: config.jwt.issuer.clone(),
        access_token_expires_minutes: config.jwt.access_token_expires_minutes,
        refresh_token_expires_days: config.jwt.refresh_token_expires_days,
    });

    // Create the realtime event bus and audit service
    let events = EventBus::new(config.realtime.channel_capacity);
    let audit = AuditService::new(db.clone(), events.clone());
    info!(
        channel_capacity = config.realtime.channel_capacity,
        "Realtime event bus configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        audit: Arc::new(audit),
        events,
        password: config.password.clone(),
        security: config.security.clone(),
        realtime: config.realtime.clone(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod activity_logs;
pub mod auth;
pub mod health;
pub mod realtime;
pub mod roles;
pub mod sessions;
pub mod users;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes behind the authorization gate
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(sessions::routes())
        .merge(users::routes())
        .merge(roles::routes())
        .merge(activity_logs::routes())
        .merge(realtime::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

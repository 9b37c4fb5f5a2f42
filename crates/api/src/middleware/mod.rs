//! HTTP middleware.

pub mod auth;

pub use auth::{Principal, auth_middleware, client_meta};

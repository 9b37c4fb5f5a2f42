//! Shared types, errors, and configuration for Vantra.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration
//! - Application-wide error types
//! - JWT token issuance and verification
//! - Authentication request/response types
//! - Pagination types for list endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod pagination;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{AccessClaims, IssuedTokens, JwtConfig, JwtError, JwtService, RefreshClaims};

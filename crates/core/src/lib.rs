//! Core security logic for Vantra.
//!
//! Pure domain logic with no web or database dependencies:
//! - Password hashing with Argon2id
//! - Account lockout state machine
//! - Role permission sets with any-of semantics

pub mod auth;
pub mod lockout;
pub mod permissions;

pub use lockout::{FailureOutcome, LockCheck, LockoutPolicy};
pub use permissions::PermissionSet;

//! `SeaORM` entity definitions.

pub mod activity_logs;
pub mod login_history;
pub mod permissions;
pub mod refresh_tokens;
pub mod role_permissions;
pub mod roles;
pub mod sessions;
pub mod users;

//! Repository abstractions for data access.

pub mod activity_log;
pub mod login_history;
pub mod permission;
pub mod refresh_token;
pub mod role;
pub mod session;
pub mod user;

pub use activity_log::{ActivityLogFilter, ActivityLogRepository, NewActivityLog};
pub use login_history::LoginHistoryRepository;
pub use permission::PermissionRepository;
pub use refresh_token::RefreshTokenRepository;
pub use role::RoleRepository;
pub use session::SessionRepository;
pub use user::{UserChanges, UserListFilter, UserRepository};

use sha2::{Digest, Sha256};

/// Hashes a presented token for storage or lookup.
///
/// Raw tokens are never persisted; sessions and refresh tokens store the
/// SHA-256 digest of the signed JWT.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = hash_token("");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

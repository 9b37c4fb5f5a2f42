//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Password policy configuration.
    #[serde(default)]
    pub password: PasswordConfig,
    /// Account lockout and session configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Realtime event stream configuration.
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as loaded from files/environment.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing access tokens.
    pub access_secret: String,
    /// Secret key for signing refresh tokens.
    pub refresh_secret: String,
    /// Token issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_expires_minutes")]
    pub access_token_expires_minutes: i64,
    /// Refresh token expiration in days.
    #[serde(default = "default_refresh_token_expires_days")]
    pub refresh_token_expires_days: i64,
}

fn default_issuer() -> String {
    "vantra".to_string()
}

fn default_access_token_expires_minutes() -> i64 {
    15
}

fn default_refresh_token_expires_days() -> i64 {
    1
}

/// Password policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// Minimum password length.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_min_length() -> usize {
    8
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
        }
    }
}

/// Account lockout and session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Consecutive failed logins before the account is locked.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: i32,
    /// Lockout duration in minutes.
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,
    /// Session lifetime in hours (distinct from the access-token expiry).
    #[serde(default = "default_session_timeout_hours")]
    pub session_timeout_hours: i64,
}

fn default_max_failed_attempts() -> i32 {
    5
}

fn default_lockout_minutes() -> i64 {
    30
}

fn default_session_timeout_hours() -> i64 {
    24
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            lockout_minutes: default_lockout_minutes(),
            session_timeout_hours: default_session_timeout_hours(),
        }
    }
}

/// Realtime event stream configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Heartbeat interval in seconds for SSE keep-alive.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Capacity of the broadcast channel feeding subscribers.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("VANTRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_defaults() {
        let security = SecurityConfig::default();
        assert_eq!(security.max_failed_attempts, 5);
        assert_eq!(security.lockout_minutes, 30);
        assert_eq!(security.session_timeout_hours, 24);
    }

    #[test]
    fn test_password_defaults() {
        assert_eq!(PasswordConfig::default().min_length, 8);
    }

    #[test]
    fn test_realtime_defaults() {
        let realtime = RealtimeConfig::default();
        assert_eq!(realtime.heartbeat_secs, 30);
        assert_eq!(realtime.channel_capacity, 256);
    }
}

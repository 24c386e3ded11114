//! Application configuration module
//!
//! Provides the process-wide configuration, loaded from environment
//! variables (optionally via a `.env` file) with defaults suitable for
//! local development.

use std::path::PathBuf;
use std::time::Duration;

use rand::RngCore;
use thiserror::Error;

/// Default HTTP port
pub const DEFAULT_SERVER_PORT: u16 = 8080;
/// Default session token lifetime in hours
pub const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24;
/// Default number of failed logins tolerated inside the window
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;
/// Default trailing rate-limit window in minutes
pub const DEFAULT_LOGIN_WINDOW_MINS: u64 = 15;
/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 10;
/// Default interval between housekeeping sweeps in seconds
pub const DEFAULT_HOUSEKEEPING_INTERVAL_SECS: u64 = 3600;
/// Default directory for uploaded PDFs
pub const DEFAULT_PDF_STORAGE_DIR: &str = "uploads/pdfs";

/// Longest accepted session lifetime, one year
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;
/// Longest accepted rate-limit window, one day
pub const MAX_LOGIN_WINDOW_MINS: u64 = 24 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to
    pub server_port: u16,
    /// Postgres connection string; `None` runs on in-memory stores
    pub database_url: Option<String>,
    /// Session token settings
    pub auth: AuthSettings,
    /// Interval between revoked-token / login-attempt sweeps
    pub housekeeping_interval: Duration,
    /// Take the client address from `X-Forwarded-For`; only safe behind a
    /// proxy that overwrites the header
    pub trust_proxy_headers: bool,
    /// Directory uploaded PDFs are written to when running on Postgres
    pub pdf_storage_dir: PathBuf,
}

/// Settings consumed by the auth engine
#[derive(Clone)]
pub struct AuthSettings {
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    /// Lifetime of a freshly minted session token
    pub jwt_ttl: Duration,
    /// Failed logins per (ip, email) that trigger the block
    pub max_login_attempts: u32,
    /// Trailing window over which failures are counted
    pub login_window: Duration,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

// Hand-written so the secret never ends up in logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("max_login_attempts", &self.max_login_attempts)
            .field("login_window", &self.login_window)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_ttl: Duration::from_secs(DEFAULT_JWT_EXPIRY_HOURS * 3600),
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            login_window: Duration::from_secs(DEFAULT_LOGIN_WINDOW_MINS * 60),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AuthSettings {
    /// Validate the auth settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.jwt_ttl.is_zero() {
            return Err(ConfigError::OutOfRange("JWT_EXPIRY_HOUR", "must be greater than zero"));
        }
        if self.jwt_ttl > Duration::from_secs(MAX_JWT_EXPIRY_HOURS * 3600) {
            return Err(ConfigError::OutOfRange("JWT_EXPIRY_HOUR", "must be at most 8760"));
        }
        if self.max_login_attempts == 0 {
            return Err(ConfigError::OutOfRange("MAX_LOGIN_ATTEMPTS", "must be greater than zero"));
        }
        if self.login_window.is_zero() {
            return Err(ConfigError::OutOfRange("LOGIN_WINDOW_MINS", "must be greater than zero"));
        }
        if self.login_window > Duration::from_secs(MAX_LOGIN_WINDOW_MINS * 60) {
            return Err(ConfigError::OutOfRange("LOGIN_WINDOW_MINS", "must be at most 1440"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::OutOfRange("BCRYPT_COST", "must be between 4 and 31"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the environment
    ///
    /// Reads `.env` first when present. A missing `JWT_SECRET` is replaced by
    /// a random per-process secret, which invalidates every session on restart.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("No .env file found, using process environment only");
        }

        let jwt_secret = match env_string("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "JWT_SECRET not set. Generated a random secret; sessions will not survive a restart."
                );
                generate_secret()
            }
        };

        let mut builder = AppConfig::builder()
            .server_port(env_parse("SERVER_PORT", DEFAULT_SERVER_PORT))
            .jwt_secret(jwt_secret)
            .jwt_ttl(scaled_secs(
                env_parse("JWT_EXPIRY_HOUR", DEFAULT_JWT_EXPIRY_HOURS),
                3600,
            ))
            .max_login_attempts(env_parse("MAX_LOGIN_ATTEMPTS", DEFAULT_MAX_LOGIN_ATTEMPTS))
            .login_window(scaled_secs(
                env_parse("LOGIN_WINDOW_MINS", DEFAULT_LOGIN_WINDOW_MINS),
                60,
            ))
            .bcrypt_cost(env_parse("BCRYPT_COST", DEFAULT_BCRYPT_COST))
            .housekeeping_interval(Duration::from_secs(env_parse(
                "HOUSEKEEPING_INTERVAL_SECS",
                DEFAULT_HOUSEKEEPING_INTERVAL_SECS,
            )))
            .trust_proxy_headers(env_parse("TRUST_PROXY_HEADERS", false));

        if let Some(dir) = env_string("PDF_STORAGE_DIR") {
            builder = builder.pdf_storage_dir(dir);
        }

        if let Some(url) = env_string("DATABASE_URL") {
            builder = builder.database_url(url);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.housekeeping_interval.is_zero() {
            return Err(ConfigError::OutOfRange(
                "HOUSEKEEPING_INTERVAL_SECS",
                "must be greater than zero",
            ));
        }
        self.auth.validate()
    }
}

/// Builder for AppConfig
#[derive(Debug)]
pub struct AppConfigBuilder {
    server_port: u16,
    database_url: Option<String>,
    auth: AuthSettings,
    housekeeping_interval: Duration,
    trust_proxy_headers: bool,
    pdf_storage_dir: PathBuf,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            database_url: None,
            auth: AuthSettings::default(),
            housekeeping_interval: Duration::from_secs(DEFAULT_HOUSEKEEPING_INTERVAL_SECS),
            trust_proxy_headers: false,
            pdf_storage_dir: PathBuf::from(DEFAULT_PDF_STORAGE_DIR),
        }
    }
}

impl AppConfigBuilder {
    /// Set the server port
    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    /// Set the database URL
    pub fn database_url(mut self, url: String) -> Self {
        self.database_url = Some(url);
        self
    }

    /// Set the session signing secret
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth.jwt_secret = secret.into();
        self
    }

    /// Set the session token lifetime
    pub fn jwt_ttl(mut self, ttl: Duration) -> Self {
        self.auth.jwt_ttl = ttl;
        self
    }

    /// Set the failed-login threshold
    pub fn max_login_attempts(mut self, max: u32) -> Self {
        self.auth.max_login_attempts = max;
        self
    }

    /// Set the rate-limit window
    pub fn login_window(mut self, window: Duration) -> Self {
        self.auth.login_window = window;
        self
    }

    /// Set the bcrypt cost factor
    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.auth.bcrypt_cost = cost;
        self
    }

    /// Set the housekeeping interval
    pub fn housekeeping_interval(mut self, interval: Duration) -> Self {
        self.housekeeping_interval = interval;
        self
    }

    /// Honour `X-Forwarded-For` when resolving the client address
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Set where uploaded PDFs are written
    pub fn pdf_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pdf_storage_dir = dir.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_port: self.server_port,
            database_url: self.database_url,
            auth: self.auth,
            housekeeping_interval: self.housekeeping_interval,
            trust_proxy_headers: self.trust_proxy_headers,
            pdf_storage_dir: self.pdf_storage_dir,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("{0} {1}")]
    OutOfRange(&'static str, &'static str),
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

/// `value * unit` seconds; an overflow saturates and is then rejected by
/// validation instead of wrapping
fn scaled_secs(value: u64, unit: u64) -> Duration {
    Duration::from_secs(value.checked_mul(unit).unwrap_or(u64::MAX))
}

fn generate_secret() -> String {
    use base64::Engine;

    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AppConfig::builder().jwt_secret("secret").build().unwrap();
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(config.auth.max_login_attempts, 5);
        assert_eq!(config.auth.login_window, Duration::from_secs(15 * 60));
        assert_eq!(config.auth.jwt_ttl, Duration::from_secs(24 * 3600));
        assert!(config.database_url.is_none());
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.pdf_storage_dir, PathBuf::from("uploads/pdfs"));
    }

    #[test]
    fn test_session_lifetime_capped() {
        let at_cap = AppConfig::builder()
            .jwt_secret("secret")
            .jwt_ttl(Duration::from_secs(MAX_JWT_EXPIRY_HOURS * 3600))
            .build();
        assert!(at_cap.is_ok());

        let result = AppConfig::builder()
            .jwt_secret("secret")
            .jwt_ttl(Duration::from_secs((MAX_JWT_EXPIRY_HOURS + 1) * 3600))
            .build();
        assert!(matches!(result, Err(ConfigError::OutOfRange("JWT_EXPIRY_HOUR", _))));
    }

    #[test]
    fn test_login_window_capped() {
        let result = AppConfig::builder()
            .jwt_secret("secret")
            .login_window(Duration::from_secs((MAX_LOGIN_WINDOW_MINS + 1) * 60))
            .build();
        assert!(matches!(result, Err(ConfigError::OutOfRange("LOGIN_WINDOW_MINS", _))));
    }

    #[test]
    fn test_huge_env_values_saturate_then_fail_validation() {
        assert_eq!(scaled_secs(24, 3600), Duration::from_secs(86_400));
        assert_eq!(scaled_secs(u64::MAX / 2, 3600), Duration::from_secs(u64::MAX));

        let result = AppConfig::builder()
            .jwt_secret("secret")
            .jwt_ttl(scaled_secs(u64::MAX, 3600))
            .login_window(scaled_secs(u64::MAX, 60))
            .build();
        assert!(matches!(result, Err(ConfigError::OutOfRange("JWT_EXPIRY_HOUR", _))));
    }

    #[test]
    fn test_missing_secret_rejected() {
        let result = AppConfig::builder().build();
        assert!(matches!(result, Err(ConfigError::MissingValue("JWT_SECRET"))));
    }

    #[test]
    fn test_invalid_database_url_rejected() {
        let result = AppConfig::builder()
            .jwt_secret("secret")
            .database_url("mysql://localhost/db".to_string())
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = AppConfig::builder()
            .jwt_secret("secret")
            .max_login_attempts(0)
            .build();
        assert!(matches!(result, Err(ConfigError::OutOfRange("MAX_LOGIN_ATTEMPTS", _))));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let result = AppConfig::builder().jwt_secret("secret").bcrypt_cost(3).build();
        assert!(result.is_err());
        let result = AppConfig::builder().jwt_secret("secret").bcrypt_cost(4).build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = AuthSettings {
            jwt_secret: "super-secret".to_string(),
            ..AuthSettings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_generated_secret_is_nonempty() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }
}

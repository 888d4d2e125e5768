//! Configuration module for ijara.

use serde::Deserialize;
use std::path::Path;

use crate::{IjaraError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL.
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/ijara.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Image storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the image storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "images".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Token and login configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared by issuer and verifier.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiry in seconds.
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_secs: u64,
    /// Login attempts per minute per client IP.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
}

fn default_access_expiry() -> u64 {
    1800 // 30 minutes
}

fn default_refresh_expiry() -> u64 {
    7 * 24 * 3600 // 7 days
}

fn default_login_rate_limit() -> u32 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_expiry_secs: default_access_expiry(),
            refresh_token_expiry_secs: default_refresh_expiry(),
            login_rate_limit: default_login_rate_limit(),
        }
    }
}

/// Phone verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Require a verified phone before registration.
    #[serde(default = "default_require_verification")]
    pub require_phone_verification: bool,
    /// Number of digits in an SMS code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Lifetime of a pending verification in seconds.
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: u64,
    /// Wrong guesses allowed before the verification is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_require_verification() -> bool {
    true
}

fn default_code_length() -> usize {
    4
}

fn default_code_ttl() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            require_phone_verification: default_require_verification(),
            code_length: default_code_length(),
            code_ttl_secs: default_code_ttl(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// SMS provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Provider name: "log" or "http".
    #[serde(default = "default_sms_provider")]
    pub provider: String,
    /// Gateway endpoint for the http provider.
    #[serde(default)]
    pub gateway_url: String,
    /// Bearer key for the gateway.
    #[serde(default)]
    pub api_key: String,
    /// Sender name shown on the handset.
    #[serde(default = "default_sms_sender")]
    pub sender: String,
}

fn default_sms_provider() -> String {
    "log".to_string()
}

fn default_sms_sender() -> String {
    "ijara".to_string()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: default_sms_provider(),
            gateway_url: String::new(),
            api_key: String::new(),
            sender: default_sms_sender(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/ijara.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Image storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Token configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Phone verification configuration.
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// SMS provider configuration.
    #[serde(default)]
    pub sms: SmsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(IjaraError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| IjaraError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `IJARA_JWT_SECRET`: token signing secret
    /// - `IJARA_DATABASE_URL`: database connection URL
    /// - `IJARA_SMS_API_KEY`: SMS gateway key
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env("IJARA_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(url) = non_empty_env("IJARA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(key) = non_empty_env("IJARA_SMS_API_KEY") {
            self.sms.api_key = key;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - access tokens would outlive refresh tokens
    /// - the http SMS provider is selected without a gateway URL
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(IjaraError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via IJARA_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.refresh_token_expiry_secs < self.auth.access_token_expiry_secs {
            return Err(IjaraError::Config(
                "refresh_token_expiry_secs must not be shorter than access_token_expiry_secs"
                    .to_string(),
            ));
        }
        match self.sms.provider.as_str() {
            "log" => {}
            "http" if self.sms.gateway_url.is_empty() => {
                return Err(IjaraError::Config(
                    "sms.provider is \"http\" but sms.gateway_url is not set".to_string(),
                ));
            }
            "http" => {}
            other => {
                return Err(IjaraError::Config(format!("unknown sms provider: {other}")));
            }
        }
        if self.registration.code_length == 0 || self.registration.code_length > 9 {
            return Err(IjaraError::Config(
                "registration.code_length must be between 1 and 9".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

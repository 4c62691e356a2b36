//! # Configuration
//!
//! Server settings loaded from an optional TOML file, then overridden from
//! the environment.
//!
//! ## Environment Variables
//!
//! - `RENTWISE_JWT_SECRET`: HMAC secret for bearer tokens (required for `server`)
//! - `RENTWISE_TOKEN_TTL_HOURS`: Token lifetime in hours (default: 24)
//! - `RENTWISE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all
//! - `RENTWISE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `RENTWISE_SWEEP_INTERVAL_SECS`: Seconds between reminder sweeps (default: 3600, 0 to disable)
//! - `RENTWISE_ADMIN_EMAIL` / `RENTWISE_ADMIN_PASSWORD`: Seeded admin account

use rentwise_core::primitives::DEFAULT_SWEEP_INTERVAL_SECS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;

/// Default global rate limit (requests per second).
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Admin account created on first start when no user exists.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("no JWT secret configured; set RENTWISE_JWT_SECRET or jwt_secret in the config file")]
    MissingSecret,
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Runtime configuration of the server and the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: u64,
    /// `None` means localhost only.
    pub cors_origins: Option<String>,
    pub rate_limit: u32,
    pub sweep_interval_secs: u64,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (if given) and apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("RENTWISE_JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(origins) = get("RENTWISE_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(email) = get("RENTWISE_ADMIN_EMAIL") {
            self.admin_email = email;
        }
        if let Some(password) = get("RENTWISE_ADMIN_PASSWORD") {
            self.admin_password = password;
        }
        if let Some(v) = get("RENTWISE_TOKEN_TTL_HOURS") {
            self.token_ttl_hours = parse_env("RENTWISE_TOKEN_TTL_HOURS", &v)?;
        }
        if let Some(v) = get("RENTWISE_RATE_LIMIT") {
            self.rate_limit = parse_env("RENTWISE_RATE_LIMIT", &v)?;
        }
        if let Some(v) = get("RENTWISE_SWEEP_INTERVAL_SECS") {
            self.sweep_interval_secs = parse_env("RENTWISE_SWEEP_INTERVAL_SECS", &v)?;
        }

        Ok(self)
    }

    /// The JWT secret, or `MissingSecret` if none is configured.
    pub fn require_jwt_secret(&self) -> Result<&str, ConfigError> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

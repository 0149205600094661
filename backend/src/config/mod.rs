//! Central module for application-wide configuration settings.
//!
//! Configuration comes from command-line flags with environment fallbacks
//! (a `.env` file is loaded first by `main`). It is read once at startup and
//! handed to the components that need it.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::auth::tokens::MIN_SECRET_LEN;

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Wallet-authenticated EMR backend
#[derive(Parser, Clone)]
#[command(name = "emr-backend")]
#[command(about = "Wallet-signature authentication backend for the EMR platform")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Secret used to sign session tokens (required outside dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Enable development mode (falls back to a built-in token secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value = "3600")]
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value = "604800")]
    pub refresh_token_ttl_secs: u64,

    /// Challenge nonce lifetime in seconds
    #[arg(long, env = "NONCE_TTL_SECS", default_value = "300")]
    pub nonce_ttl_secs: u64,

    /// How often expired nonces are swept from memory, in seconds
    #[arg(long, env = "NONCE_SWEEP_INTERVAL_SECS", default_value = "60")]
    pub nonce_sweep_interval_secs: u64,

    /// Honour the `role` field sent with a login request
    #[arg(long, env = "ALLOW_LOGIN_ROLE_CLAIM", default_value = "true", action = clap::ArgAction::Set)]
    pub allow_login_role_claim: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET is required unless DEV_MODE is set")]
    MissingSecret,

    #[error("JWT_SECRET must be at least 32 characters")]
    SecretTooShort,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("access token lifetime must be shorter than refresh token lifetime")]
    AccessOutlivesRefresh,
}

impl Config {
    /// Check the values that clap cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt_secret()?;

        for (name, value) in [
            ("ACCESS_TOKEN_TTL_SECS", self.access_token_ttl_secs),
            ("REFRESH_TOKEN_TTL_SECS", self.refresh_token_ttl_secs),
            ("NONCE_TTL_SECS", self.nonce_ttl_secs),
            ("NONCE_SWEEP_INTERVAL_SECS", self.nonce_sweep_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        if self.access_token_ttl_secs >= self.refresh_token_ttl_secs {
            return Err(ConfigError::AccessOutlivesRefresh);
        }
        Ok(())
    }

    /// Effective token secret (the built-in one in dev mode).
    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        let secret = match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => secret.as_str(),
            (None, true) => DEV_SECRET,
            (None, false) => return Err(ConfigError::MissingSecret),
        };

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort);
        }
        Ok(secret)
    }

    pub fn nonce_ttl(&self) -> Duration {
        Duration::from_secs(self.nonce_ttl_secs)
    }

    pub fn nonce_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.nonce_sweep_interval_secs)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("dev_mode", &self.dev_mode)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("nonce_ttl_secs", &self.nonce_ttl_secs)
            .field("nonce_sweep_interval_secs", &self.nonce_sweep_interval_secs)
            .field("allow_login_role_claim", &self.allow_login_role_claim)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

//! Server configuration module.
//!
//! Parses configuration from environment variables for the StagePass server.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `STAGEPASS_DATABASE_URL` | No | `sqlite:stagepass.db?mode=rwc` | SQLite connection string |
//! | `STAGEPASS_JWT_SECRET` | No | dev secret (insecure) | HS256 token signing secret |
//! | `STAGEPASS_USERS` | No | `john:cena,batman:pass` | Format: `user1:pass1,user2:pass2` |
//! | `STAGEPASS_DELETE_POLICY` | No | `restrict` | `restrict` or `cascade` for event deletes |
//! | `PORT` | No | 8080 | HTTP server port |
//!
//! User ids are assigned from the position in `STAGEPASS_USERS`, starting
//! at 1. Leaving `STAGEPASS_JWT_SECRET` unset logs a warning at startup.

use std::env;

use thiserror::Error;
use tracing::warn;

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 8080;

/// Default SQLite connection string (file database, created on first run).
const DEFAULT_DATABASE_URL: &str = "sqlite:stagepass.db?mode=rwc";

/// Default token signing secret. Only suitable for local development.
const DEFAULT_JWT_SECRET: &str = "change-me-dev-secret";

/// Default credential list.
const DEFAULT_USERS: &str = "john:cena,batman:pass";

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Port number is invalid.
    #[error("invalid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Policy applied when deleting an event that still has artists or
/// resources referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Reject the delete with a conflict while dependents exist.
    Restrict,

    /// Delete the dependents and the event in one transaction.
    Cascade,
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string.
    pub database_url: String,

    /// Secret used to sign and verify HS256 tokens.
    pub jwt_secret: String,

    /// Credential list as (username, password) pairs, in declaration order.
    /// User ids are the 1-based position in this list.
    pub users: Vec<(String, String)>,

    /// Behavior when deleting an event with dependent rows.
    pub delete_policy: DeletePolicy,

    /// HTTP server port.
    pub port: u16,
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// Every variable has a default, so this only fails on malformed
    /// values, never on absent ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `STAGEPASS_USERS` is set but not in `user:pass,user:pass` format
    /// - `STAGEPASS_DELETE_POLICY` is set to anything other than
    ///   `restrict` or `cascade`
    /// - `STAGEPASS_JWT_SECRET` is set to an empty string
    /// - `PORT` is not a valid u16
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stagepass_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = parse_database_url();
        let jwt_secret = parse_jwt_secret()?;
        let users = parse_users()?;
        let delete_policy = parse_delete_policy()?;
        let port = parse_port()?;

        let config = Self {
            database_url,
            jwt_secret,
            users,
            delete_policy,
            port,
        };

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!(
                "STAGEPASS_JWT_SECRET is not set - tokens are signed with an insecure \
                 development secret. Do not use in production!"
            );
        }

        Ok(config)
    }
}

/// Parse the STAGEPASS_DATABASE_URL environment variable.
///
/// Returns the default file-database URL if not set or empty.
fn parse_database_url() -> String {
    match env::var("STAGEPASS_DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => DEFAULT_DATABASE_URL.to_string(),
    }
}

/// Parse the STAGEPASS_JWT_SECRET environment variable.
///
/// Returns the development default if not set. An explicitly empty secret
/// is rejected rather than silently replaced.
fn parse_jwt_secret() -> Result<String, ConfigError> {
    match env::var("STAGEPASS_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => Ok(secret),
        Ok(_) => Err(ConfigError::InvalidFormat {
            var: "STAGEPASS_JWT_SECRET".to_string(),
            message: "secret cannot be empty".to_string(),
        }),
        Err(_) => Ok(DEFAULT_JWT_SECRET.to_string()),
    }
}

/// Parse the STAGEPASS_USERS environment variable.
///
/// Expected format: `user1:pass1,user2:pass2`. Falls back to the default
/// credential list when unset or blank.
fn parse_users() -> Result<Vec<(String, String)>, ConfigError> {
    let raw = match env::var("STAGEPASS_USERS") {
        Ok(s) if !s.trim().is_empty() => s,
        _ => DEFAULT_USERS.to_string(),
    };

    let mut users = Vec::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let parts: Vec<&str> = pair.splitn(2, ':').collect();
        if parts.len() != 2 {
            return Err(ConfigError::InvalidFormat {
                var: "STAGEPASS_USERS".to_string(),
                message: format!("expected 'username:password' format, got '{}'", pair),
            });
        }

        let username = parts[0].trim();
        let password = parts[1].trim();

        if username.is_empty() {
            return Err(ConfigError::InvalidFormat {
                var: "STAGEPASS_USERS".to_string(),
                message: "username cannot be empty".to_string(),
            });
        }

        if password.is_empty() {
            return Err(ConfigError::InvalidFormat {
                var: "STAGEPASS_USERS".to_string(),
                message: format!("password for user '{}' cannot be empty", username),
            });
        }

        users.push((username.to_string(), password.to_string()));
    }

    if users.is_empty() {
        return Err(ConfigError::InvalidFormat {
            var: "STAGEPASS_USERS".to_string(),
            message: "no username:password pairs found".to_string(),
        });
    }

    Ok(users)
}

/// Parse the STAGEPASS_DELETE_POLICY environment variable.
///
/// Returns `DeletePolicy::Restrict` if not set.
fn parse_delete_policy() -> Result<DeletePolicy, ConfigError> {
    match env::var("STAGEPASS_DELETE_POLICY") {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "restrict" => Ok(DeletePolicy::Restrict),
            "cascade" => Ok(DeletePolicy::Cascade),
            other => Err(ConfigError::InvalidFormat {
                var: "STAGEPASS_DELETE_POLICY".to_string(),
                message: format!("expected 'restrict' or 'cascade', got '{}'", other),
            }),
        },
        Err(_) => Ok(DeletePolicy::Restrict),
    }
}

/// Parse the PORT environment variable.
///
/// Returns the default port if not set.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => Ok(port_str.parse()?),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

//! Database configuration
//!
//! Connection parameters are resolved from the environment exactly once at
//! startup and threaded into the pipeline as an explicit struct; nothing in
//! the worker path reads process-wide state.

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

use crate::error::{IngestError, Result};

// ============================================================================
// Database Configuration Constants
// ============================================================================

/// Default database host.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default database port.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Default database user.
pub const DEFAULT_DB_USER: &str = "log";

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "log";

/// Database connection configuration
///
/// Each worker task opens its own connection from these parameters; a single
/// connection handle is never shared across concurrent workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `DB_HOST`: database host (default `localhost`)
    /// - `DB_PORT`: database port (default `3306`)
    /// - `DB_USER`: database user (default `log`)
    /// - `DB_PASSWD`: database password (required, no default)
    /// - `DB_NAME`: database name (default `log`)
    ///
    /// A `.env` file in the working directory is honored when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let password = std::env::var("DB_PASSWD")
            .map_err(|_| IngestError::config("DB_PASSWD must be set; it has no default"))?;

        Ok(Self {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_PORT),
            user: std::env::var("DB_USER").unwrap_or_else(|_| DEFAULT_DB_USER.to_string()),
            password,
            database: std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
        })
    }

    /// Connect options for one dedicated worker connection
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

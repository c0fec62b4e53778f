use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Default database host for local development.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default MySQL port.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Default database user for local development.
pub const DEFAULT_DB_USER: &str = "root";

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "customer_behavior";

/// Default destination table name.
pub const DEFAULT_DB_TABLE: &str = "customer";

/// Default maximum connections in the pool.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 2;

/// Default connection acquire timeout in seconds.
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection descriptor for the sink database. Sourced from the environment
/// so credentials never live in the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub table: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load configuration from environment variables (`SCRUBBER_DB_*`),
    /// falling back to development defaults. A `.env` file is honored when
    /// present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = DatabaseConfig {
            host: std::env::var("SCRUBBER_DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
            port: std::env::var("SCRUBBER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_PORT),
            username: std::env::var("SCRUBBER_DB_USER")
                .unwrap_or_else(|_| DEFAULT_DB_USER.to_string()),
            password: std::env::var("SCRUBBER_DB_PASSWORD").unwrap_or_default(),
            database: std::env::var("SCRUBBER_DB_NAME")
                .unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
            table: std::env::var("SCRUBBER_DB_TABLE")
                .unwrap_or_else(|_| DEFAULT_DB_TABLE.to_string()),
            max_connections: std::env::var("SCRUBBER_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            connect_timeout_secs: std::env::var("SCRUBBER_DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_CONNECT_TIMEOUT_SECS),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(PipelineError::Data(
                "Database port must be greater than 0".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(PipelineError::Data(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.table.is_empty() {
            return Err(PipelineError::Data(
                "Destination table name cannot be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(PipelineError::Data(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            username: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            database: DEFAULT_DB_NAME.to_string(),
            table: DEFAULT_DB_TABLE.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DB_CONNECT_TIMEOUT_SECS,
        }
    }
}

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the delivery workflow service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowSettings {
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Workflow limits
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Largest number of deliveries accepted by one bulk cancellation
    pub max_bulk_size: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://courier-deliveries.db".to_string(),
                max_connections: 5,
                auto_migrate: true,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            workflow: WorkflowConfig { max_bulk_size: 100 },
        }
    }
}

impl WorkflowSettings {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (courier-deliveries.toml)
    /// 3. Environment variables (prefixed with COURIER_DELIVERIES__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("courier-deliveries.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("COURIER_DELIVERIES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: WorkflowSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        if self.workflow.max_bulk_size == 0 {
            anyhow::bail!("workflow.max_bulk_size must be at least 1");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    /// Returns whether a `.env` file was found and loaded
    pub fn load_env_file() -> Result<bool> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            return Ok(true);
        }
        Ok(false)
    }
}

use anyhow::Result;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;

/// Owns the connection pool backing the delivery tables
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Initialize database with automatic migrations
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let in_memory = config.url.contains(":memory:");

        // Create database if it doesn't exist
        if !in_memory && !sqlx::Sqlite::database_exists(&config.url).await? {
            info!("Creating database at {}", config.url);
            sqlx::Sqlite::create_database(&config.url).await?;
        }

        let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);
        // Every connection to an in-memory database is a separate database
        let max_connections = if in_memory { 1 } else { config.max_connections };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Closing the only connection would drop the database with it
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        if config.auto_migrate {
            Self::migrate(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &SqlitePool) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get database pool for queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

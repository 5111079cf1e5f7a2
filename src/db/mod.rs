//! PostgreSQL pool for the escrow repositories
//!
//! The schema itself is owned by the marketplace; this module only opens and
//! health-checks the pool the repositories share.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Pool setup error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Database health check failed: {0}")]
    HealthCheckError(String),
}

fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
}

/// Open the pool and wait for a first connection
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        max_connections = config.db_max_connections,
        "Connecting to database at {}",
        config.database_url_masked()
    );

    let pool = pool_options(config)
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    tracing::info!("Database connection pool created");
    Ok(pool)
}

/// Build the pool without connecting; the first query opens a connection
pub fn create_lazy_pool(config: &Config) -> Result<PgPool, DbError> {
    pool_options(config)
        .connect_lazy(&config.database_url)
        .map_err(|e| DbError::ConnectionError(e.to_string()))
}

/// Round-trip a trivial query
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    Ok(())
}

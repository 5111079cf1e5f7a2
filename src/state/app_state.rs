//! Application state: the escrow service wired to PostgreSQL

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::address::PgAddressRepository;
use crate::config::Config;
use crate::db;
use crate::escrow::{EscrowService, PgEscrowRatioRepository, PgEscrowRepository};
use crate::listing::{PgListingItemTemplateRepository, PgPaymentInformationRepository};
use crate::messaging::{ChannelBroadcaster, EscrowActionFactories};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub escrow_service: Arc<EscrowService>,
    pub broadcaster: ChannelBroadcaster,
}

impl AppState {
    /// Open the pool and wire every collaborator
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config)
            .await
            .context("Failed to create database pool")?;

        db::check_health(&pool)
            .await
            .context("Database is not reachable")?;

        Ok(Self::from_pool(config, pool))
    }

    pub fn from_pool(config: Config, pool: PgPool) -> Self {
        let broadcaster = ChannelBroadcaster::new(config.broadcast_capacity);

        let escrow_service = Arc::new(EscrowService::new(
            Arc::new(PgEscrowRepository::new(pool.clone())),
            Arc::new(PgEscrowRatioRepository::new(pool.clone())),
            Arc::new(PgListingItemTemplateRepository::new(pool.clone())),
            Arc::new(PgPaymentInformationRepository::new(pool.clone())),
            Arc::new(PgAddressRepository::new(pool.clone())),
            EscrowActionFactories::new(&config.message_version),
            Arc::new(broadcaster.clone()),
        ));

        tracing::info!(
            environment = config.environment.as_str(),
            message_version = %config.message_version,
            "Escrow service initialized"
        );

        Self {
            config,
            pool,
            escrow_service,
            broadcaster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn test_from_pool_wires_broadcaster() {
        let config = Config {
            database_url: "postgresql://localhost/escrow_test".to_string(),
            environment: Environment::Development,
            db_max_connections: 1,
            db_acquire_timeout_secs: 1,
            broadcast_capacity: 4,
            message_version: "0.1.0.0".to_string(),
            log_level: "info".to_string(),
        };
        let pool = db::create_lazy_pool(&config).unwrap();

        let state = AppState::from_pool(config, pool);
        let _rx = state.broadcaster.subscribe();

        assert_eq!(state.broadcaster.subscriber_count(), 1);
        assert_eq!(state.config.broadcast_capacity, 4);
    }
}

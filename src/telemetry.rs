//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error if a global subscriber was already installed.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(environment = config.environment.as_str(), "Tracing initialized");
    Ok(())
}

//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG` when set, else from the configured level
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter(config)?)
        .with_ansi(config.ansi)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

//! Logging initialization

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{InstrumentationConfig, LogFormat};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Finished spans from
/// [`LogTracer`](crate::trace::LogTracer) are logged under the
/// `courier::span` target.
///
/// # Errors
///
/// Fails if the level filter is invalid or a global subscriber is already
/// installed.
pub fn init_tracing(config: &InstrumentationConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()?,
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
    Ok(())
}

/// Initialize from `COURIER_*` environment variables
///
/// # Errors
///
/// Fails if the settings cannot be loaded or a subscriber is already installed.
pub fn init_default() -> Result<()> {
    let config = InstrumentationConfig::from_env()?;
    init_tracing(&config)
}

/// Initialize with development settings
///
/// # Errors
///
/// Fails if a subscriber is already installed.
pub fn init_dev() -> Result<()> {
    init_tracing(&InstrumentationConfig::dev())
}

//! Subscriber setup

use hadb_core::{Error, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber with default logging settings
///
/// Does nothing if a subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use hadb_telemetry::init_telemetry;
///
/// init_telemetry();
/// ```
pub fn init_telemetry() {
    if let Err(e) = init_telemetry_with(&LoggingConfig::default()) {
        tracing::debug!(error = %e, "Telemetry already initialized");
    }
}

/// Install the global subscriber described by `config`
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if the
/// filter does not parse or a subscriber is already installed.
pub fn init_telemetry_with(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_line_number(true),
            )
            .try_init()
    };

    installed.map_err(|e| Error::message(format!("Failed to install subscriber: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| Error::config_error(format!("Invalid log filter '{}': {}", config.filter, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: "hadb=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_second_init_fails() {
        init_telemetry();
        assert!(init_telemetry_with(&LoggingConfig::default()).is_err());
    }
}

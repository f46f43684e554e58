//! Logging initialization
//!
//! Structured logging via tracing-subscriber: EnvFilter (RUST_LOG wins
//! over the configured level) with either a plain fmt layer or JSON
//! output.

use crate::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Initialize the global tracing subscriber.
///
/// Returns an error string if a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json {
        Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| format!("Failed to init tracing: {}", e))
    } else {
        Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| format!("Failed to init tracing: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_twice() {
        let config = LoggingConfig::default();
        // First call may or may not win the global slot depending on
        // test order; the second must report rather than panic.
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}

//! Structured logging setup.
//!
//! Builds a tracing filter from the logging config and installs the global
//! subscriber. `RUST_LOG` takes precedence over the config file when set.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Build filter directives from a logging config.
///
/// Produces `base_level,relay::component1=level1,...` so per-component
/// overrides stack on top of the base level.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter = config.level.clone();
    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter.push_str(&format!(",relay::{}={}", component, level));
        }
    }
    filter
}

/// Install the global subscriber.
///
/// An explicit `level` (from the CLI) overrides the config; `RUST_LOG`
/// overrides both. Safe to call once per process.
pub fn init(config: &LoggingConfig, level: Option<&str>) {
    let directives = match level {
        Some(level) => level.to_string(),
        None => build_filter_directives(config),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

//! Configuration for the relay router.
//!
//! Loaded from a TOML file with defaults for every section, then optional
//! `RELAY_*` environment overrides. Invalid environment values are
//! silently ignored (defaults are kept).
//!
//! # Example
//!
//! ```rust
//! use relay::config::RelayConfig;
//!
//! let toml = r#"
//! [backends.local]
//! url = "http://localhost:11434"
//!
//! [routing]
//! allow_budget_overrun = false
//! "#;
//! let config: RelayConfig = toml::from_str(toml).unwrap();
//! assert!(!config.routing.allow_budget_overrun);
//! ```

mod error;

pub use error::ConfigError;

use crate::backend::Backend;
use crate::budget::BudgetLimits;
use crate::pricing::{Rate, RateCard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Unified configuration for the router, executor, and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Backend endpoints and model names
    pub backends: BackendsConfig,
    /// Per-backend rate overrides (USD per million tokens)
    pub pricing: HashMap<Backend, Rate>,
    /// Budget caps and persistence paths
    pub budget: BudgetConfig,
    /// Selection policy knobs
    pub routing: RoutingConfig,
    /// Outbound call deadlines
    pub timeouts: TimeoutConfig,
    /// Log level and per-component overrides
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendsConfig {
    pub local: LocalBackendConfig,
    pub provider_a: ProviderConfig,
    pub provider_b: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    pub url: String,
    pub model: String,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3:8b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
    pub small_model: String,
    pub large_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            small_model: "small".to_string(),
            large_model: "large".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub daily_cap_usd: f64,
    pub weekly_cap_usd: f64,
    pub monthly_cap_usd: f64,
    /// Where to persist user-set limits; in-memory when unset
    pub settings_path: Option<PathBuf>,
    /// Where to persist the usage ledger; in-memory when unset
    pub ledger_path: Option<PathBuf>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        let limits = BudgetLimits::default();
        Self {
            daily_cap_usd: limits.daily_cap_usd,
            weekly_cap_usd: limits.weekly_cap_usd,
            monthly_cap_usd: limits.monthly_cap_usd,
            settings_path: None,
            ledger_path: None,
        }
    }
}

impl BudgetConfig {
    pub fn limits(&self) -> BudgetLimits {
        BudgetLimits {
            daily_cap_usd: self.daily_cap_usd,
            weekly_cap_usd: self.weekly_cap_usd,
            monthly_cap_usd: self.monthly_cap_usd,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// When no candidate is affordable, still select the cheapest remote
    /// backend (soft budget overrun) instead of failing the request.
    pub allow_budget_overrun: bool,
    /// Per-request cost cap used when the caller does not supply one
    pub default_request_cap_usd: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            allow_budget_overrun: true,
            default_request_cap_usd: 0.50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub probe_secs: u64,
    pub generate_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 5,
            generate_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error)
    pub level: String,
    /// Per-component level overrides, e.g. `router = "debug"`
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            component_levels: None,
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `RELAY_*` environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("RELAY_LOCAL_URL") {
            self.backends.local.url = url;
        }
        if let Ok(url) = std::env::var("RELAY_PROVIDER_A_URL") {
            self.backends.provider_a.url = url;
        }
        if let Ok(url) = std::env::var("RELAY_PROVIDER_B_URL") {
            self.backends.provider_b.url = url;
        }
        if let Ok(cap) = std::env::var("RELAY_REQUEST_CAP_USD") {
            if let Ok(cap) = cap.parse() {
                self.routing.default_request_cap_usd = cap;
            }
        }
        self
    }

    /// Validate configuration at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [
            ("backends.local.url", &self.backends.local.url),
            ("backends.provider_a.url", &self.backends.provider_a.url),
            ("backends.provider_b.url", &self.backends.provider_b.url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }

        if let Err(message) = self.budget.limits().validate() {
            return Err(ConfigError::Validation {
                field: "budget".to_string(),
                message,
            });
        }

        if self.routing.default_request_cap_usd < 0.0 {
            return Err(ConfigError::Validation {
                field: "routing.default_request_cap_usd".to_string(),
                message: "must be >= 0.0".to_string(),
            });
        }

        for (backend, rate) in &self.pricing {
            if rate.input_per_mtok < 0.0 || rate.output_per_mtok < 0.0 {
                return Err(ConfigError::Validation {
                    field: format!("pricing.{}", backend),
                    message: "rates must be >= 0.0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Rate card: built-in defaults with per-backend config overrides.
    pub fn rate_card(&self) -> RateCard {
        if self.pricing.is_empty() {
            return RateCard::builtin();
        }
        let mut rates = HashMap::new();
        for backend in Backend::ALL {
            if let Some(rate) = self.pricing.get(&backend) {
                rates.insert(backend, *rate);
            } else if let Some(rate) = RateCard::builtin().rate(backend) {
                rates.insert(backend, rate);
            }
        }
        RateCard::new(rates)
    }

    /// Model name dispatched for a backend.
    pub fn model_for(&self, backend: Backend) -> &str {
        match backend {
            Backend::Local => &self.backends.local.model,
            Backend::RemoteSmallA => &self.backends.provider_a.small_model,
            Backend::RemoteLargeA => &self.backends.provider_a.large_model,
            Backend::RemoteSmallB => &self.backends.provider_b.small_model,
            Backend::RemoteLargeB => &self.backends.provider_b.large_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.routing.allow_budget_overrun);
        assert_eq!(config.timeouts.probe_secs, 5);
        assert_eq!(config.timeouts.generate_secs, 30);
        assert_eq!(config.budget.daily_cap_usd, 1.00);
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [backends.local]
            url = "http://10.0.0.5:11434"
            model = "phi3"

            [budget]
            daily_cap_usd = 2.5

            [routing]
            allow_budget_overrun = false
        "#;
        let config: RelayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backends.local.url, "http://10.0.0.5:11434");
        assert_eq!(config.backends.local.model, "phi3");
        assert_eq!(config.budget.daily_cap_usd, 2.5);
        // Untouched sections keep defaults
        assert_eq!(config.budget.weekly_cap_usd, 5.0);
        assert!(!config.routing.allow_budget_overrun);
    }

    #[test]
    fn pricing_overrides_merge_over_builtin() {
        let toml = r#"
            [pricing.remote-small-a]
            input_per_mtok = 0.05
            output_per_mtok = 0.10
        "#;
        let config: RelayConfig = toml::from_str(toml).unwrap();
        let card = config.rate_card();

        let overridden = card.rate(Backend::RemoteSmallA).unwrap();
        assert_eq!(overridden.input_per_mtok, 0.05);

        // Other backends keep built-in rates
        let builtin = RateCard::builtin().rate(Backend::RemoteLargeA).unwrap();
        assert_eq!(card.rate(Backend::RemoteLargeA).unwrap(), builtin);
    }

    #[test]
    fn validation_rejects_empty_url() {
        let mut config = RelayConfig::default();
        config.backends.local.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_negative_caps() {
        let mut config = RelayConfig::default();
        config.budget.daily_cap_usd = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_negative_rates() {
        let mut config = RelayConfig::default();
        config.pricing.insert(
            Backend::RemoteSmallB,
            Rate {
                input_per_mtok: -0.1,
                output_per_mtok: 0.5,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let result = RelayConfig::load(Some(Path::new("/nonexistent/relay.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn model_mapping() {
        let config = RelayConfig::default();
        assert_eq!(config.model_for(Backend::Local), "llama3:8b");
        assert_eq!(config.model_for(Backend::RemoteSmallA), "small");
        assert_eq!(config.model_for(Backend::RemoteLargeB), "large");
    }
}

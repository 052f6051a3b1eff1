//! Command-line interface for the relay router.
//!
//! # Commands
//!
//! - `route` - Decide a backend for a prompt without dispatching it
//! - `exec` - Route a prompt, dispatch it, and print the response
//! - `health` - Probe the local backend and show its health
//! - `usage` - Show rolling spend against the configured caps
//!
//! # Example
//!
//! ```bash
//! # Dry-run a routing decision
//! relay route "refactor this component for performance"
//!
//! # Execute with a tighter per-request cap
//! relay exec --cap 0.05 "summarize this changelog"
//!
//! # Spend so far, as JSON
//! relay usage --json
//! ```

pub mod exec;
pub mod health;
pub mod output;
pub mod route;
pub mod usage;

use crate::agent::{LocalAgent, ProviderAAgent, ProviderBAgent};
use crate::budget::{
    BudgetPolicy, JsonSettingsStore, JsonlUsageLedger, MemorySettingsStore, MemoryUsageLedger,
    SettingsStore, UsageLedger,
};
use crate::classifier::TaskComplexity;
use crate::config::RelayConfig;
use crate::health::HealthMonitor;
use crate::router::{ModelMap, RequestExecutor, RouteOptions, Router};
use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Relay - cost- and health-aware AI request router
#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Routes AI requests across local and metered backends"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "RELAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide a backend for a prompt without dispatching it
    Route(RouteArgs),
    /// Route a prompt, dispatch it, and print the response
    Exec(ExecArgs),
    /// Probe the local backend and show its health
    Health(HealthArgs),
    /// Show rolling spend against the configured caps
    Usage(UsageArgs),
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Prompt to route
    pub prompt: String,

    /// Per-request cost cap in USD
    #[arg(long)]
    pub cap: Option<f64>,

    /// Prefer the free local backend when healthy
    #[arg(long)]
    pub prefer_local: bool,

    /// Skip classification (simple, medium, complex)
    #[arg(long)]
    pub complexity: Option<TaskComplexity>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Prompt to execute
    pub prompt: String,

    /// Per-request cost cap in USD
    #[arg(long)]
    pub cap: Option<f64>,

    /// Prefer the free local backend when healthy
    #[arg(long)]
    pub prefer_local: bool,

    /// Skip classification (simple, medium, complex)
    #[arg(long)]
    pub complexity: Option<TaskComplexity>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteArgs {
    pub fn options(&self) -> RouteOptions {
        RouteOptions {
            request_cap_usd: self.cap,
            force_complexity: self.complexity,
            prefer_local: self.prefer_local,
        }
    }
}

impl ExecArgs {
    pub fn options(&self) -> RouteOptions {
        RouteOptions {
            request_cap_usd: self.cap,
            force_complexity: self.complexity,
            prefer_local: self.prefer_local,
        }
    }
}

/// Everything a command handler may need, wired from one config.
pub struct Components {
    pub executor: RequestExecutor,
    pub budget: Arc<BudgetPolicy>,
    pub health: Arc<HealthMonitor>,
}

/// Wire the full component stack from configuration.
pub fn build_components(config: &RelayConfig) -> Components {
    let client = Client::new();
    let rates = config.rate_card();

    let settings: Arc<dyn SettingsStore> = match &config.budget.settings_path {
        Some(path) => Arc::new(JsonSettingsStore::new(path.clone())),
        None => Arc::new(MemorySettingsStore::new()),
    };
    let ledger: Arc<dyn UsageLedger> = match &config.budget.ledger_path {
        Some(path) => Arc::new(JsonlUsageLedger::new(path.clone())),
        None => Arc::new(MemoryUsageLedger::new()),
    };
    let budget = Arc::new(BudgetPolicy::with_defaults(
        settings,
        ledger,
        config.budget.limits(),
    ));

    let health = Arc::new(HealthMonitor::new(
        config.backends.local.url.clone(),
        client.clone(),
        Duration::from_secs(config.timeouts.probe_secs),
    ));

    let router = Router::new(
        rates.clone(),
        budget.clone(),
        health.clone(),
        config.routing.allow_budget_overrun,
        config.routing.default_request_cap_usd,
    );

    let generate_timeout = Duration::from_secs(config.timeouts.generate_secs);
    let executor = RequestExecutor::new(
        router,
        rates,
        budget.clone(),
        health.clone(),
        Arc::new(LocalAgent::new(
            config.backends.local.url.clone(),
            client.clone(),
            generate_timeout,
        )),
        Arc::new(ProviderAAgent::new(
            config.backends.provider_a.url.clone(),
            client.clone(),
            generate_timeout,
        )),
        Arc::new(ProviderBAgent::new(
            config.backends.provider_b.url.clone(),
            client,
            generate_timeout,
        )),
        ModelMap::from_config(config),
    );

    Components {
        executor,
        budget,
        health,
    }
}

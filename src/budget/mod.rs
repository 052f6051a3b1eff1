//! Budget policy: rolling spend windows against configured caps.
//!
//! Spend is summed from the usage ledger over three rolling windows (day,
//! week, month, all UTC; weeks start on Sunday). Persistence failures fail
//! open: a broken ledger reports zero usage and broken settings fall back
//! to default limits, so budget trouble never blocks requests outright.
//! Enforcement is soft by the same token — concurrent requests read
//! possibly-stale usage and may jointly overrun a cap by a small margin.

pub mod store;

pub use store::{
    JsonSettingsStore, JsonlUsageLedger, MemorySettingsStore, MemoryUsageLedger, SettingsStore,
    StoreError, UsageLedger,
};

use crate::backend::Backend;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Spending caps per rolling window, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    pub daily_cap_usd: f64,
    pub weekly_cap_usd: f64,
    pub monthly_cap_usd: f64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            daily_cap_usd: 1.00,
            weekly_cap_usd: 5.00,
            monthly_cap_usd: 15.00,
        }
    }
}

impl BudgetLimits {
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_cap_usd < 0.0 || self.weekly_cap_usd < 0.0 || self.monthly_cap_usd < 0.0 {
            return Err("budget caps must be >= 0.0".to_string());
        }
        Ok(())
    }
}

/// One completed request's actual cost. Append-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub backend: Backend,
    pub cost_usd: f64,
}

/// Spend summed over the three rolling windows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageSummary {
    pub daily_usd: f64,
    pub weekly_usd: f64,
    pub monthly_usd: f64,
}

/// Computes remaining spend across rolling windows.
///
/// Holds no mutable state of its own; both collaborators are injected so
/// tests can instantiate independent policies over mock stores.
pub struct BudgetPolicy {
    settings: Arc<dyn SettingsStore>,
    ledger: Arc<dyn UsageLedger>,
    defaults: BudgetLimits,
}

impl BudgetPolicy {
    pub fn new(settings: Arc<dyn SettingsStore>, ledger: Arc<dyn UsageLedger>) -> Self {
        Self::with_defaults(settings, ledger, BudgetLimits::default())
    }

    /// Like [`BudgetPolicy::new`] but with configured fallback limits for
    /// when the settings store holds none.
    pub fn with_defaults(
        settings: Arc<dyn SettingsStore>,
        ledger: Arc<dyn UsageLedger>,
        defaults: BudgetLimits,
    ) -> Self {
        Self {
            settings,
            ledger,
            defaults,
        }
    }

    /// Current spend in the daily/weekly/monthly windows ending now.
    ///
    /// Ledger failures fail open to all-zero usage.
    pub async fn current_usage(&self) -> UsageSummary {
        let now = Utc::now();
        self.usage_at(now).await
    }

    pub(crate) async fn usage_at(&self, now: DateTime<Utc>) -> UsageSummary {
        let daily_usd = self.window_sum(start_of_day(now), now).await;
        let weekly_usd = self.window_sum(start_of_week(now), now).await;
        let monthly_usd = self.window_sum(start_of_month(now), now).await;
        UsageSummary {
            daily_usd,
            weekly_usd,
            monthly_usd,
        }
    }

    async fn window_sum(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        match self.ledger.sum(start, end).await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "Usage ledger read failed, assuming zero spend");
                0.0
            }
        }
    }

    /// Limits from the settings store, or the configured defaults when
    /// unset or unreadable.
    pub async fn limits(&self) -> BudgetLimits {
        match self.settings.get().await {
            Ok(Some(limits)) => limits,
            Ok(None) => self.defaults,
            Err(e) => {
                tracing::warn!(error = %e, "Settings store read failed, using default limits");
                self.defaults
            }
        }
    }

    /// Spendable amount for one request: the request cap, further limited
    /// by whatever remains in each window (clamped at zero).
    pub async fn effective_budget(&self, request_cap_usd: f64) -> f64 {
        let limits = self.limits().await;
        let usage = self.current_usage().await;

        let remaining_daily = (limits.daily_cap_usd - usage.daily_usd).max(0.0);
        let remaining_weekly = (limits.weekly_cap_usd - usage.weekly_usd).max(0.0);
        let remaining_monthly = (limits.monthly_cap_usd - usage.monthly_usd).max(0.0);

        request_cap_usd
            .min(remaining_daily)
            .min(remaining_weekly)
            .min(remaining_monthly)
    }

    /// Append one usage record for a completed request.
    pub async fn record(&self, record: UsageRecord) -> Result<(), StoreError> {
        self.ledger.append(record).await
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}

/// Weeks start on Sunday (day 0).
fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = now.weekday().num_days_from_sunday() as i64;
    start_of_day(now - Duration::days(days_back))
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}

//! Routing decision types.

use crate::backend::Backend;
use crate::classifier::TaskComplexity;
use crate::health::HealthSnapshot;
use serde::Serialize;
use uuid::Uuid;

/// Caller-supplied knobs for a single routing request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    /// Per-request cost cap in USD; the configured default when unset.
    pub request_cap_usd: Option<f64>,
    /// Skip classification and use this complexity.
    pub force_complexity: Option<TaskComplexity>,
    /// Prefer the free local backend when it is healthy.
    pub prefer_local: bool,
}

/// Why a backend was selected over the rest of the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// First candidate whose estimated cost fit the effective budget
    FirstAffordable,
    /// No candidate was affordable; cheapest remote chosen as overrun
    BudgetOverrun,
    /// Local was selected but unavailable; cheapest remote substituted
    LocalSubstituted,
}

/// A completed routing decision, returned to callers and logged.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// Correlates the decision with execution and ledger entries.
    pub request_id: Uuid,
    pub selected_backend: Backend,
    /// Estimated request cost against the selected backend's rates.
    pub estimated_cost_usd: f64,
    pub complexity: TaskComplexity,
    pub reason: SelectionReason,
    /// Human-readable explanation of the selection.
    pub reasoning: String,
    /// Heuristic fit score in [0.5, 1.0].
    pub confidence: f64,
    /// Local backend health at decision time.
    pub health: HealthSnapshot,
    /// Effective budget the walk ran against, after window clamping.
    pub effective_budget_usd: f64,
    /// Estimated prompt tokens.
    pub input_tokens: u32,
}

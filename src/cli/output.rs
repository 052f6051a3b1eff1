//! Output formatting helpers for CLI commands.

use crate::backend::Backend;
use crate::budget::{BudgetLimits, UsageSummary};
use crate::classifier::TaskComplexity;
use crate::health::HealthSnapshot;
use crate::router::{ExecutionOutcome, RouteDecision, SelectionReason};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

/// View model for a routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    pub request_id: String,
    pub backend: Backend,
    pub complexity: TaskComplexity,
    pub estimated_cost_usd: f64,
    pub effective_budget_usd: f64,
    pub input_tokens: u32,
    pub confidence: f64,
    pub reason: SelectionReason,
    pub reasoning: String,
    pub local_status: String,
    pub consecutive_failures: u32,
}

impl From<&RouteDecision> for DecisionView {
    fn from(decision: &RouteDecision) -> Self {
        Self {
            request_id: decision.request_id.to_string(),
            backend: decision.selected_backend,
            complexity: decision.complexity,
            estimated_cost_usd: decision.estimated_cost_usd,
            effective_budget_usd: decision.effective_budget_usd,
            input_tokens: decision.input_tokens,
            confidence: decision.confidence,
            reason: decision.reason,
            reasoning: decision.reasoning.clone(),
            local_status: decision.health.status.to_string(),
            consecutive_failures: decision.health.consecutive_failures,
        }
    }
}

/// Format a routing decision as a two-column table.
pub fn format_decision_table(view: &DecisionView) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![Cell::new("Backend"), Cell::new(view.backend)]);
    table.add_row(vec![Cell::new("Complexity"), Cell::new(view.complexity)]);
    table.add_row(vec![
        Cell::new("Estimated cost"),
        Cell::new(format!("${:.6}", view.estimated_cost_usd)),
    ]);
    table.add_row(vec![
        Cell::new("Effective budget"),
        Cell::new(format!("${:.6}", view.effective_budget_usd)),
    ]);
    table.add_row(vec![
        Cell::new("Input tokens"),
        Cell::new(view.input_tokens),
    ]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.2}", view.confidence)),
    ]);
    table.add_row(vec![
        Cell::new("Local status"),
        Cell::new(&view.local_status),
    ]);
    table.add_row(vec![Cell::new("Reasoning"), Cell::new(&view.reasoning)]);

    table.to_string()
}

pub fn format_decision_json(view: &DecisionView) -> String {
    serde_json::to_string_pretty(&json!({ "decision": view }))
        .unwrap_or_else(|_| "{}".to_string())
}

/// View model for an executed request.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeView {
    #[serde(flatten)]
    pub decision: DecisionView,
    pub served_backend: Backend,
    pub actual_cost_usd: f64,
    pub fell_back_to_local: bool,
    pub response: String,
}

impl From<&ExecutionOutcome> for OutcomeView {
    fn from(outcome: &ExecutionOutcome) -> Self {
        Self {
            decision: DecisionView::from(&outcome.decision),
            served_backend: outcome.served_backend,
            actual_cost_usd: outcome.actual_cost_usd,
            fell_back_to_local: outcome.fell_back_to_local,
            response: outcome.response.clone(),
        }
    }
}

/// Format an executed request: the response, then a cost footer.
pub fn format_outcome_pretty(view: &OutcomeView) -> String {
    let mut output = String::new();
    output.push_str(&view.response);
    output.push_str("\n\n");
    output.push_str(&format!(
        "[{} | ${:.6}{}]",
        view.served_backend,
        view.actual_cost_usd,
        if view.fell_back_to_local {
            " | fell back to local"
        } else {
            ""
        }
    ));
    output
}

pub fn format_outcome_json(view: &OutcomeView) -> String {
    serde_json::to_string_pretty(&json!({ "result": view }))
        .unwrap_or_else(|_| "{}".to_string())
}

/// View model for local backend health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub status: String,
    pub consecutive_failures: u32,
    pub available: bool,
    pub needs_fallback: bool,
}

impl From<HealthSnapshot> for HealthView {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            status: snapshot.status.to_string(),
            consecutive_failures: snapshot.consecutive_failures,
            available: snapshot.available(),
            needs_fallback: snapshot.needs_fallback(),
        }
    }
}

pub fn format_health_pretty(view: &HealthView) -> String {
    let icon = if view.available { "✓" } else { "✗" };
    let mut output = format!(
        "{} Local backend: {} ({} consecutive failures)\n",
        icon, view.status, view.consecutive_failures
    );
    if view.needs_fallback {
        output.push_str("Routing is avoiding the local backend\n");
    }
    output
}

pub fn format_health_json(view: &HealthView) -> String {
    serde_json::to_string_pretty(&json!({ "health": view }))
        .unwrap_or_else(|_| "{}".to_string())
}

/// View model for spend against caps.
#[derive(Debug, Clone, Serialize)]
pub struct UsageView {
    pub daily_usd: f64,
    pub daily_cap_usd: f64,
    pub weekly_usd: f64,
    pub weekly_cap_usd: f64,
    pub monthly_usd: f64,
    pub monthly_cap_usd: f64,
}

impl UsageView {
    pub fn new(usage: UsageSummary, limits: BudgetLimits) -> Self {
        Self {
            daily_usd: usage.daily_usd,
            daily_cap_usd: limits.daily_cap_usd,
            weekly_usd: usage.weekly_usd,
            weekly_cap_usd: limits.weekly_cap_usd,
            monthly_usd: usage.monthly_usd,
            monthly_cap_usd: limits.monthly_cap_usd,
        }
    }
}

/// Format spend as a window/spent/cap/remaining table.
pub fn format_usage_table(view: &UsageView) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Window", "Spent", "Cap", "Remaining"]);

    for (window, spent, cap) in [
        ("Daily", view.daily_usd, view.daily_cap_usd),
        ("Weekly", view.weekly_usd, view.weekly_cap_usd),
        ("Monthly", view.monthly_usd, view.monthly_cap_usd),
    ] {
        table.add_row(vec![
            Cell::new(window),
            Cell::new(format!("${:.6}", spent)),
            Cell::new(format!("${:.2}", cap)),
            Cell::new(format!("${:.6}", (cap - spent).max(0.0))),
        ]);
    }

    table.to_string()
}

pub fn format_usage_json(view: &UsageView) -> String {
    serde_json::to_string_pretty(&json!({ "usage": view }))
        .unwrap_or_else(|_| "{}".to_string())
}

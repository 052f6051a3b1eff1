//! Backend selection under budget and health constraints.
//!
//! A route walks an ordered candidate list determined by task complexity,
//! the caller's local preference, and local backend health, and picks the
//! first candidate whose estimated cost fits the effective budget. The
//! local backend is always admissible on cost (it is free); a selected but
//! unavailable local backend is substituted with the cheapest remote.

mod decision;
mod error;
mod execute;

pub use decision::{RouteDecision, RouteOptions, SelectionReason};
pub use error::{ExecuteError, RouteError};
pub use execute::{ExecutionOutcome, ModelMap, RequestExecutor};

use crate::backend::{Backend, Strength};
use crate::budget::BudgetPolicy;
use crate::classifier::{classify, TaskComplexity};
use crate::estimator::estimate_tokens;
use crate::health::{HealthMonitor, HealthSnapshot};
use crate::pricing::RateCard;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Selects a backend for each request.
pub struct Router {
    rates: RateCard,
    budget: Arc<BudgetPolicy>,
    health: Arc<HealthMonitor>,
    allow_budget_overrun: bool,
    default_request_cap_usd: f64,
}

impl Router {
    pub fn new(
        rates: RateCard,
        budget: Arc<BudgetPolicy>,
        health: Arc<HealthMonitor>,
        allow_budget_overrun: bool,
        default_request_cap_usd: f64,
    ) -> Self {
        Self {
            rates,
            budget,
            health,
            allow_budget_overrun,
            default_request_cap_usd,
        }
    }

    /// Route one prompt: classify, probe local health, compute the
    /// effective budget, and walk the candidate list.
    pub async fn route(
        &self,
        prompt: &str,
        options: RouteOptions,
        cancel: &CancellationToken,
    ) -> Result<RouteDecision, RouteError> {
        let request_id = Uuid::new_v4();
        let input_tokens = estimate_tokens(prompt);
        let complexity = options.force_complexity.unwrap_or_else(|| classify(prompt));

        let health = self.health.probe(cancel).await;
        let request_cap = options
            .request_cap_usd
            .unwrap_or(self.default_request_cap_usd);
        let effective_budget = self.budget.effective_budget(request_cap).await;

        let candidates = candidates(complexity, options.prefer_local, health);

        let walked = self.first_affordable(&candidates, input_tokens, effective_budget);
        let (mut selected, mut estimated_cost, mut reason) = match walked {
            Some((backend, cost)) => (backend, cost, SelectionReason::FirstAffordable),
            None if self.allow_budget_overrun => {
                let (backend, cost) = self
                    .rates
                    .cheapest_remote(input_tokens)
                    .ok_or(RouteError::NoRemoteRate)?;
                (backend, cost, SelectionReason::BudgetOverrun)
            }
            None => {
                return Err(RouteError::BudgetExhausted {
                    available: effective_budget,
                })
            }
        };

        // A selected local backend must actually be serving; otherwise
        // swap in the cheapest remote and re-estimate the cost.
        if selected.is_local() && !health.available() {
            let (backend, cost) = self
                .rates
                .cheapest_remote(input_tokens)
                .ok_or(RouteError::NoRemoteRate)?;
            selected = backend;
            estimated_cost = cost;
            reason = SelectionReason::LocalSubstituted;
        }

        let confidence = confidence(complexity, selected, options.prefer_local);
        let reasoning = reasoning(
            complexity,
            selected,
            estimated_cost,
            effective_budget,
            reason,
            health,
        );

        tracing::info!(
            request_id = %request_id,
            backend = %selected,
            complexity = %complexity,
            estimated_cost_usd = estimated_cost,
            effective_budget_usd = effective_budget,
            reason = ?reason,
            confidence,
            "Routed request"
        );
        metrics::counter!("relay_route_decisions_total", "backend" => selected.to_string())
            .increment(1);

        Ok(RouteDecision {
            request_id,
            selected_backend: selected,
            estimated_cost_usd: estimated_cost,
            complexity,
            reason,
            reasoning,
            confidence,
            health,
            effective_budget_usd: effective_budget,
            input_tokens,
        })
    }

    /// First candidate whose estimated cost fits the budget. Local is
    /// admissible regardless of budget; unpriced backends are skipped.
    fn first_affordable(
        &self,
        candidates: &[Backend],
        input_tokens: u32,
        budget: f64,
    ) -> Option<(Backend, f64)> {
        for &backend in candidates {
            let Some(cost) = self.rates.price_estimated(backend, input_tokens) else {
                continue;
            };
            if backend.is_local() || cost <= budget {
                return Some((backend, cost));
            }
        }
        None
    }
}

/// Ordered candidate list for a request.
fn candidates(
    complexity: TaskComplexity,
    prefer_local: bool,
    health: HealthSnapshot,
) -> Vec<Backend> {
    use Backend::*;

    if health.needs_fallback() {
        // Local is demoted outright; escalate by complexity.
        return match complexity {
            TaskComplexity::Complex => vec![RemoteSmallA, RemoteLargeA, RemoteLargeB],
            TaskComplexity::Medium => vec![RemoteSmallA, RemoteLargeA, RemoteSmallB],
            TaskComplexity::Simple => vec![RemoteSmallA, RemoteSmallB, RemoteLargeA],
        };
    }

    if prefer_local {
        return vec![Local, RemoteSmallA, RemoteSmallB];
    }

    match complexity {
        TaskComplexity::Complex => vec![RemoteLargeA, RemoteLargeB, RemoteSmallA],
        TaskComplexity::Medium => vec![RemoteSmallA, RemoteSmallB, RemoteLargeA],
        TaskComplexity::Simple => {
            let mut list = Vec::with_capacity(4);
            if health.available() {
                list.push(Local);
            }
            list.extend([RemoteSmallA, RemoteSmallB, RemoteLargeA]);
            list
        }
    }
}

/// Heuristic fit score for a selection, clamped to [0.5, 1.0].
fn confidence(complexity: TaskComplexity, selected: Backend, prefer_local: bool) -> f64 {
    let target = match complexity {
        TaskComplexity::Simple => Strength::Cheap,
        TaskComplexity::Medium => Strength::Mid,
        TaskComplexity::Complex => Strength::Strong,
    };

    let mut score: f64 = 0.7;
    if selected.strength() == target {
        score = if complexity == TaskComplexity::Complex {
            0.9
        } else {
            0.85
        };
    }
    if prefer_local && !selected.is_local() {
        score -= 0.1;
    }
    score.clamp(0.5, 1.0)
}

fn reasoning(
    complexity: TaskComplexity,
    selected: Backend,
    estimated_cost: f64,
    effective_budget: f64,
    reason: SelectionReason,
    health: HealthSnapshot,
) -> String {
    let base = format!(
        "{} task routed to {} (est ${:.6}, budget ${:.6})",
        complexity, selected, estimated_cost, effective_budget
    );
    match reason {
        SelectionReason::FirstAffordable => base,
        SelectionReason::BudgetOverrun => {
            format!("{}; no candidate affordable, cheapest remote chosen", base)
        }
        SelectionReason::LocalSubstituted => format!(
            "{}; local backend unavailable ({}), cheapest remote substituted",
            base, health.status
        ),
    }
}

//! Request execution: dispatch a routed request to its backend.
//!
//! A failed remote call falls back to the local backend at most once, and
//! only when a fresh probe shows it serving. Every successful response is
//! costed from token estimates and appended to the usage ledger; a ledger
//! write failure is logged but never fails a request that already has its
//! response.

use super::{ExecuteError, RouteDecision, RouteOptions, Router};
use crate::agent::GenerateAgent;
use crate::backend::{Backend, Provider};
use crate::budget::{BudgetPolicy, UsageRecord};
use crate::config::RelayConfig;
use crate::estimator::estimate_tokens;
use crate::health::HealthMonitor;
use crate::pricing::RateCard;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Model name per backend, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct ModelMap {
    local: String,
    small_a: String,
    large_a: String,
    small_b: String,
    large_b: String,
}

impl ModelMap {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            local: config.backends.local.model.clone(),
            small_a: config.backends.provider_a.small_model.clone(),
            large_a: config.backends.provider_a.large_model.clone(),
            small_b: config.backends.provider_b.small_model.clone(),
            large_b: config.backends.provider_b.large_model.clone(),
        }
    }

    fn for_backend(&self, backend: Backend) -> &str {
        match backend {
            Backend::Local => &self.local,
            Backend::RemoteSmallA => &self.small_a,
            Backend::RemoteLargeA => &self.large_a,
            Backend::RemoteSmallB => &self.small_b,
            Backend::RemoteLargeB => &self.large_b,
        }
    }
}

/// A routed, dispatched, and costed request.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub decision: RouteDecision,
    /// Backend that actually produced the response.
    pub served_backend: Backend,
    pub response: String,
    /// Cost computed from actual prompt and response token estimates.
    pub actual_cost_usd: f64,
    pub fell_back_to_local: bool,
}

/// Routes and dispatches requests end to end.
pub struct RequestExecutor {
    router: Router,
    rates: RateCard,
    budget: Arc<BudgetPolicy>,
    health: Arc<HealthMonitor>,
    local: Arc<dyn GenerateAgent>,
    provider_a: Arc<dyn GenerateAgent>,
    provider_b: Arc<dyn GenerateAgent>,
    models: ModelMap,
}

impl RequestExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: Router,
        rates: RateCard,
        budget: Arc<BudgetPolicy>,
        health: Arc<HealthMonitor>,
        local: Arc<dyn GenerateAgent>,
        provider_a: Arc<dyn GenerateAgent>,
        provider_b: Arc<dyn GenerateAgent>,
        models: ModelMap,
    ) -> Self {
        Self {
            router,
            rates,
            budget,
            health,
            local,
            provider_a,
            provider_b,
            models,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    fn agent_for(&self, backend: Backend) -> &Arc<dyn GenerateAgent> {
        match backend.provider() {
            Provider::Local => &self.local,
            Provider::A => &self.provider_a,
            Provider::B => &self.provider_b,
        }
    }

    /// Route the prompt, dispatch it, and record the actual cost.
    pub async fn execute(
        &self,
        prompt: &str,
        options: RouteOptions,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let decision = self.router.route(prompt, options, cancel).await?;
        let primary = decision.selected_backend;
        let agent = self.agent_for(primary);
        let model = self.models.for_backend(primary);

        let (served, response) = match agent.generate(model, prompt, cancel).await {
            Ok(text) => (primary, text),
            Err(source) => {
                if primary.is_local() {
                    return Err(ExecuteError::Backend {
                        backend: primary,
                        source,
                    });
                }

                // One shot at the local fallback, gated on a fresh probe.
                let snapshot = self.health.probe(cancel).await;
                if !snapshot.available() {
                    return Err(ExecuteError::Backend {
                        backend: primary,
                        source,
                    });
                }

                tracing::warn!(
                    request_id = %decision.request_id,
                    backend = %primary,
                    error = %source,
                    "Remote backend failed, falling back to local"
                );
                metrics::counter!("relay_local_fallbacks_total").increment(1);

                let local_model = self.models.for_backend(Backend::Local);
                match self.local.generate(local_model, prompt, cancel).await {
                    Ok(text) => (Backend::Local, text),
                    Err(fallback) => {
                        return Err(ExecuteError::FallbackFailed {
                            backend: primary,
                            source,
                            fallback,
                        })
                    }
                }
            }
        };

        let output_tokens = estimate_tokens(&response);
        let actual_cost_usd = match self.rates.price(served, decision.input_tokens, output_tokens) {
            Some(cost) => cost,
            None => {
                tracing::warn!(backend = %served, "No rate for served backend, recording zero cost");
                0.0
            }
        };

        let record = UsageRecord {
            timestamp: Utc::now(),
            backend: served,
            cost_usd: actual_cost_usd,
        };
        if let Err(e) = self.budget.record(record).await {
            tracing::warn!(
                request_id = %decision.request_id,
                error = %e,
                "Failed to append usage record"
            );
        }

        tracing::info!(
            request_id = %decision.request_id,
            backend = %served,
            actual_cost_usd,
            output_tokens,
            fell_back = served != primary,
            "Request completed"
        );
        metrics::counter!("relay_requests_total", "backend" => served.to_string()).increment(1);
        metrics::histogram!("relay_request_cost_usd").record(actual_cost_usd);

        Ok(ExecutionOutcome {
            decision,
            served_backend: served,
            response,
            actual_cost_usd,
            fell_back_to_local: served != primary && served.is_local(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{LocalAgent, ProviderAAgent, ProviderBAgent, DEFAULT_GENERATE_TIMEOUT};
    use crate::budget::{MemorySettingsStore, MemoryUsageLedger, UsageLedger};
    use crate::classifier::TaskComplexity;
    use crate::health::DEFAULT_PROBE_TIMEOUT;
    use chrono::{Duration, Utc};
    use mockito::{Server, ServerGuard};
    use reqwest::Client;

    struct Fixture {
        executor: RequestExecutor,
        ledger: Arc<MemoryUsageLedger>,
        // Keep the guards alive for the duration of the test
        _local: ServerGuard,
        _provider_a: ServerGuard,
        _provider_b: ServerGuard,
    }

    async fn fixture(local_status: &str) -> Fixture {
        let mut local = Server::new_async().await;
        local
            .mock("GET", "/status")
            .with_status(200)
            .with_body(format!(r#"{{"status":"{}"}}"#, local_status))
            .expect_at_least(1)
            .create_async()
            .await;

        let provider_a = Server::new_async().await;
        let provider_b = Server::new_async().await;

        let client = Client::new();
        let ledger = Arc::new(MemoryUsageLedger::new());
        let budget = Arc::new(BudgetPolicy::new(
            Arc::new(MemorySettingsStore::new()),
            ledger.clone() as Arc<dyn UsageLedger>,
        ));
        let health = Arc::new(HealthMonitor::new(
            local.url(),
            client.clone(),
            DEFAULT_PROBE_TIMEOUT,
        ));
        let router = Router::new(
            RateCard::builtin(),
            budget.clone(),
            health.clone(),
            true,
            0.50,
        );
        let models = ModelMap {
            local: "local-model".to_string(),
            small_a: "a-small".to_string(),
            large_a: "a-large".to_string(),
            small_b: "b-small".to_string(),
            large_b: "b-large".to_string(),
        };
        let executor = RequestExecutor::new(
            router,
            RateCard::builtin(),
            budget,
            health,
            Arc::new(LocalAgent::new(
                local.url(),
                client.clone(),
                DEFAULT_GENERATE_TIMEOUT,
            )),
            Arc::new(ProviderAAgent::new(
                provider_a.url(),
                client.clone(),
                DEFAULT_GENERATE_TIMEOUT,
            )),
            Arc::new(ProviderBAgent::new(
                provider_b.url(),
                client,
                DEFAULT_GENERATE_TIMEOUT,
            )),
            models,
        );

        Fixture {
            executor,
            ledger,
            _local: local,
            _provider_a: provider_a,
            _provider_b: provider_b,
        }
    }

    #[tokio::test]
    async fn simple_request_served_locally_costs_nothing() {
        let mut fx = fixture("connected").await;
        fx._local
            .mock("POST", "/generate")
            .with_status(200)
            .with_body(r#"{"response":"local answer"}"#)
            .create_async()
            .await;

        let outcome = fx
            .executor
            .execute(
                "hello there",
                RouteOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.served_backend, Backend::Local);
        assert_eq!(outcome.response, "local answer");
        assert_eq!(outcome.actual_cost_usd, 0.0);
        assert!(!outcome.fell_back_to_local);

        // The free request still lands in the ledger
        let total = fx
            .ledger
            .sum(Utc::now() - Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(total, 0.0);
    }

    #[tokio::test]
    async fn remote_success_records_actual_cost() {
        let mut fx = fixture("connected").await;
        fx._provider_a
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"response":"a thorough architectural answer"}"#)
            .create_async()
            .await;

        let outcome = fx
            .executor
            .execute(
                "design pattern for a microservice split",
                RouteOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.served_backend, Backend::RemoteLargeA);
        assert!(outcome.actual_cost_usd > 0.0);
        // Actual cost uses the real response size, not the 800-token default
        assert!(outcome.actual_cost_usd < outcome.decision.estimated_cost_usd);

        let total = fx
            .ledger
            .sum(Utc::now() - Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert!((total - outcome.actual_cost_usd).abs() < 1e-12);
    }

    #[tokio::test]
    async fn failed_remote_falls_back_to_available_local() {
        let mut fx = fixture("connected").await;
        fx._provider_a
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        fx._local
            .mock("POST", "/generate")
            .with_status(200)
            .with_body(r#"{"response":"local saved it"}"#)
            .create_async()
            .await;

        let outcome = fx
            .executor
            .execute(
                "debug production memory leak",
                RouteOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.decision.selected_backend, Backend::RemoteLargeA);
        assert_eq!(outcome.served_backend, Backend::Local);
        assert!(outcome.fell_back_to_local);
        assert_eq!(outcome.actual_cost_usd, 0.0);
    }

    #[tokio::test]
    async fn failed_remote_with_unavailable_local_is_hard_error() {
        let mut fx = fixture("disconnected").await;
        fx._provider_a
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = fx
            .executor
            .execute(
                "hello",
                RouteOptions {
                    force_complexity: Some(TaskComplexity::Complex),
                    ..Default::default()
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(ExecuteError::Backend { .. })));
        let total = fx
            .ledger
            .sum(Utc::now() - Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(total, 0.0);
    }

    #[tokio::test]
    async fn fallback_failure_propagates_both_errors() {
        let mut fx = fixture("connected").await;
        fx._provider_a
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("remote boom")
            .create_async()
            .await;
        fx._local
            .mock("POST", "/generate")
            .with_status(500)
            .with_body("local boom")
            .create_async()
            .await;

        let result = fx
            .executor
            .execute(
                "design pattern for a microservice split",
                RouteOptions::default(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(ExecuteError::FallbackFailed {
                backend: Backend::RemoteLargeA,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn failed_local_does_not_fall_back() {
        let mut fx = fixture("connected").await;
        fx._local
            .mock("POST", "/generate")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = fx
            .executor
            .execute(
                "hello",
                RouteOptions::default(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(ExecuteError::Backend {
                backend: Backend::Local,
                ..
            })
        ));
    }
}

//! Backend adapters.
//!
//! Each adapter owns its provider's request/response wire shape and
//! nothing else: it takes a model name and a prompt, performs one HTTP
//! call with a bounded timeout, and returns the generated text. Retry and
//! fallback policy live in the router, not here.

mod error;
mod local;
mod provider_a;
mod provider_b;

pub use error::AgentError;
pub use local::LocalAgent;
pub use provider_a::ProviderAAgent;
pub use provider_b::ProviderBAgent;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Default timeout for generate calls.
pub const DEFAULT_GENERATE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// A text-generation adapter for one provider.
///
/// Implementations must be thread-safe; they are shared across concurrent
/// request handling.
#[async_trait]
pub trait GenerateAgent: Send + Sync {
    /// Provider name for logging.
    fn provider_name(&self) -> &'static str;

    /// Generate a completion for `prompt` with the given model.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError>;
}

/// Map a reqwest send error to the agent error taxonomy.
pub(crate) fn map_send_error(e: reqwest::Error, timeout: std::time::Duration) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout(timeout.as_millis() as u64)
    } else {
        AgentError::Network(e.to_string())
    }
}

/// Read a non-success response into an upstream error.
pub(crate) async fn upstream_error(response: reqwest::Response) -> AgentError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AgentError::Upstream { status, message }
}

/// Race a request future against cancellation.
pub(crate) async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl std::future::Future<Output = Result<T, AgentError>>,
) -> Result<T, AgentError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        result = fut => result,
    }
}

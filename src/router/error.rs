//! Routing and execution error types.

use crate::agent::AgentError;
use crate::backend::Backend;
use thiserror::Error;

/// Errors from backend selection.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No candidate fits the effective budget and overrun is disabled.
    #[error("No backend affordable within ${available:.6} effective budget")]
    BudgetExhausted { available: f64 },

    /// The rate card holds no remote backend to fall back on.
    #[error("No remote backend has a configured rate")]
    NoRemoteRate,
}

/// Errors from routing plus dispatching a request.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The selected backend failed and no fallback applied.
    #[error("Backend {backend} failed: {source}")]
    Backend {
        backend: Backend,
        source: AgentError,
    },

    /// The selected backend failed and so did the local fallback.
    #[error("Backend {backend} failed ({source}); local fallback also failed: {fallback}")]
    FallbackFailed {
        backend: Backend,
        source: AgentError,
        fallback: AgentError,
    },
}

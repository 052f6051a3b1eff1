//! Relay - cost- and health-aware router for AI serving backends
//!
//! This library decides, per natural-language request, which of several
//! serving backends (one free local, several metered remote) should handle
//! it, under a per-request cost cap, rolling spend budgets, and the live
//! health of the local backend. It then executes the request with a single
//! bounded fallback and records actual usage.

pub mod agent;
pub mod backend;
pub mod budget;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod estimator;
pub mod health;
pub mod logging;
pub mod pricing;
pub mod router;

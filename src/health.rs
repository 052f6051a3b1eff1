//! Health monitoring for the local backend.
//!
//! A consecutive-failure crash detector layered on a boolean probe: any
//! successful probe resets the counter, any failure increments it, and
//! three failures in a row (or an explicit disconnected report) demote the
//! local backend in routing. Recovery is instant on the next success —
//! there is no hysteresis or cooldown, a simplification carried from the
//! original design.

use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Consecutive failed probes before the local backend is demoted.
const FAILURE_THRESHOLD: u32 = 3;

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status reported by (or inferred from) a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Backend reports itself connected and serving
    Connected,
    /// Backend responded but reports itself disconnected
    Disconnected,
    /// Non-success HTTP response with no decodable body
    ServiceUnavailable,
    /// Connection failure or timeout
    NetworkError,
    /// Decodable response with an unrecognized status string
    Unknown,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeStatus::Connected => "connected",
            ProbeStatus::Disconnected => "disconnected",
            ProbeStatus::ServiceUnavailable => "service_unavailable",
            ProbeStatus::NetworkError => "network_error",
            ProbeStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Point-in-time view of local backend health, attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub status: ProbeStatus,
    pub consecutive_failures: u32,
}

impl HealthSnapshot {
    /// Whether the local backend can actually serve a request right now.
    pub fn available(&self) -> bool {
        self.status == ProbeStatus::Connected
    }

    /// Whether routing should avoid the local backend entirely.
    pub fn needs_fallback(&self) -> bool {
        self.consecutive_failures >= FAILURE_THRESHOLD || self.status == ProbeStatus::Disconnected
    }
}

/// Wire shape of the local backend's status endpoint.
#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    failures: Option<u32>,
}

/// Probes the local backend and tracks consecutive failures.
///
/// The counter is atomic: multiple in-flight requests probe concurrently
/// and must not lose increments.
pub struct HealthMonitor {
    base_url: String,
    client: Client,
    probe_timeout: Duration,
    consecutive_failures: AtomicU32,
}

impl HealthMonitor {
    pub fn new(base_url: String, client: Client, probe_timeout: Duration) -> Self {
        Self {
            base_url,
            client,
            probe_timeout,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Probe the status endpoint once and fold the outcome into the
    /// failure counter. Cancellation counts as a failed probe.
    pub async fn probe(&self, cancel: &CancellationToken) -> HealthSnapshot {
        let (status, ok) = tokio::select! {
            _ = cancel.cancelled() => (ProbeStatus::NetworkError, false),
            outcome = self.probe_once() => outcome,
        };

        let consecutive_failures = if ok {
            self.consecutive_failures.store(0, Ordering::SeqCst);
            0
        } else {
            self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1
        };

        let snapshot = HealthSnapshot {
            status,
            consecutive_failures,
        };

        if !ok {
            metrics::counter!("relay_probe_failures_total").increment(1);
            tracing::debug!(
                status = %status,
                consecutive_failures,
                needs_fallback = snapshot.needs_fallback(),
                "Local backend probe failed"
            );
        }

        snapshot
    }

    async fn probe_once(&self) -> (ProbeStatus, bool) {
        let url = format!("{}/status", self.base_url);

        let response = match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return (ProbeStatus::NetworkError, false),
        };

        let http_ok = response.status().is_success();
        let body = match response.json::<StatusBody>().await {
            Ok(body) => body,
            Err(_) => return (ProbeStatus::ServiceUnavailable, false),
        };

        // A decodable body drives the status directly. Only a clean 2xx
        // with a decodable body counts as a successful probe; the reported
        // status can still demote the backend in routing.
        let status = match body.status.to_lowercase().as_str() {
            "connected" => ProbeStatus::Connected,
            "disconnected" => ProbeStatus::Disconnected,
            _ => ProbeStatus::Unknown,
        };
        (status, http_ok)
    }

    /// Current consecutive-failure count without probing.
    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }
}

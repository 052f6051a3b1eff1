//! Persistence capabilities for budget limits and the usage ledger.
//!
//! Two narrow interfaces injected into the budget policy: a settings store
//! for the configured limits and an append-only ledger of completed
//! requests. Backed in-memory for tests and by JSON files for the CLI.

use super::{BudgetLimits, UsageRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

/// Errors from settings or ledger persistence.
///
/// The budget policy absorbs these fail-open; they surface only as
/// warnings in the logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed persisted state: {0}")]
    Parse(String),
}

/// Read/write access to the persisted budget limits.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Option<BudgetLimits>, StoreError>;
    async fn set(&self, limits: BudgetLimits) -> Result<(), StoreError>;
}

/// Append-only record of completed requests' actual costs.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Append one record. Concurrent appends must not interleave.
    async fn append(&self, record: UsageRecord) -> Result<(), StoreError>;

    /// Sum of `cost` over records with `start <= timestamp < end`.
    async fn sum(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64, StoreError>;
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    limits: RwLock<Option<BudgetLimits>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: BudgetLimits) -> Self {
        Self {
            limits: RwLock::new(Some(limits)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> Result<Option<BudgetLimits>, StoreError> {
        Ok(*self.limits.read().unwrap_or_else(|e| e.into_inner()))
    }

    async fn set(&self, limits: BudgetLimits) -> Result<(), StoreError> {
        *self.limits.write().unwrap_or_else(|e| e.into_inner()) = Some(limits);
        Ok(())
    }
}

/// In-memory usage ledger.
#[derive(Debug, Default)]
pub struct MemoryUsageLedger {
    records: RwLock<Vec<UsageRecord>>,
}

impl MemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records, oldest first. Test helper.
    pub fn records(&self) -> Vec<UsageRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn append(&self, record: UsageRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(())
    }

    async fn sum(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp < end)
            .map(|r| r.cost_usd)
            .sum())
    }
}

/// Settings store backed by a single JSON file.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get(&self) -> Result<Option<BudgetLimits>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let limits =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Some(limits))
    }

    async fn set(&self, limits: BudgetLimits) -> Result<(), StoreError> {
        let content =
            serde_json::to_string_pretty(&limits).map_err(|e| StoreError::Parse(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

/// Usage ledger backed by a JSON-lines file, one record per line.
///
/// Appends are serialized through a mutex so concurrent requests cannot
/// interleave partial lines. Reads take the same lock; staleness between
/// a read and a concurrent append is accepted (budget enforcement is
/// soft, not transactional).
pub struct JsonlUsageLedger {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonlUsageLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl UsageLedger for JsonlUsageLedger {
    async fn append(&self, record: UsageRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&record).map_err(|e| StoreError::Parse(e.to_string()))?;
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            writeln!(file, "{}", line)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Parse(format!("append task failed: {}", e)))?
    }

    async fn sum(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64, StoreError> {
        let _guard = self.lock.lock().await;
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0.0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0.0;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<UsageRecord>(line) {
                Ok(record) => {
                    if record.timestamp >= start && record.timestamp < end {
                        total += record.cost_usd;
                    }
                }
                Err(e) => {
                    // Skip the bad line rather than blocking all requests
                    tracing::warn!(error = %e, "Skipping malformed usage ledger line");
                }
            }
        }
        Ok(total)
    }
}

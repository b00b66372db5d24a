use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::sync::Mutex;

pub const EMPTY_LOG: &str = "No Stripe operations performed yet.";
const HEADER: &str = "📋 Stripe Operations Audit Log 📋\n\n";
const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub parameters: Value,
}

impl AuditEntry {
    pub fn new(operation: impl Into<String>, parameters: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            parameters,
        }
    }

    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[async_trait]
pub trait AuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "Logging operation: {} with params: {}",
            entry.operation,
            entry.parameters
        );
        Ok(())
    }
}

pub struct MultiSink {
    sinks: Vec<Box<dyn AuditSink + Send + Sync>>,
}

pub fn multi_sink(sinks: Vec<Box<dyn AuditSink + Send + Sync>>) -> MultiSink {
    MultiSink { sinks }
}

#[async_trait]
impl AuditSink for MultiSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>> {
        for sink in &self.sinks {
            sink.record(entry).await?;
        }
        Ok(())
    }
}

/// In-memory record of mutating Stripe operations, shared by every session
/// of the process.
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    sink: Box<dyn AuditSink + Send + Sync>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_sink(Box::new(TracingSink))
    }
}

impl AuditLog {
    pub fn with_sink(sink: Box<dyn AuditSink + Send + Sync>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Appends an entry. Sink failures are logged and swallowed so a broken
    /// store never fails an operation Stripe already performed.
    pub async fn record(&self, operation: &str, parameters: Value) {
        let entry = AuditEntry::new(operation, parameters);
        if let Err(e) = self.sink.record(&entry).await {
            tracing::error!("failed to persist audit entry for {}: {}", operation, e);
        }
        self.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn render(&self) -> String {
        let entries = self.lock();
        tracing::debug!("Generating audit log with {} entries", entries.len());
        render_entries(&entries)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEntry>> {
        // a poisoned log still holds valid entries
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn render_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_LOG.to_string();
    }

    let mut report = String::from(HEADER);
    for entry in entries {
        let parameters = serde_json::to_string_pretty(&entry.parameters)
            .unwrap_or_else(|_| entry.parameters.to_string());
        report.push_str(&format!("[{}]\n", entry.timestamp_iso()));
        report.push_str(&format!("Operation: {}\n", entry.operation));
        report.push_str(&format!("Parameters: {}\n", parameters));
        report.push_str(&"-".repeat(SEPARATOR_WIDTH));
        report.push('\n');
    }
    report
}

//! Audit sink port

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};

/// Destination for audit entries
///
/// Implementations must accept concurrent writers. One call per completed
/// verification; callers do not retry.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> AuditResult<()>;
}

/// In-memory audit sink
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
    reject_writes: AtomicBool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (persistence-failure tests)
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of every recorded entry, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().unwrap().clone()
    }

    /// Entries for one asset, oldest first
    pub fn entries_for(&self, asset_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap();
        entries.iter().filter(|e| e.asset_id == asset_id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(AuditError::WriteRejected("memory sink rejecting writes".to_string()));
        }
        self.entries.write().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Writes every entry to each inner sink in registration order
///
/// All sinks are attempted even if one fails; the first error is returned.
#[derive(Default)]
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink; entries are written in the order sinks were added
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AuditSink for FanoutAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        let mut first_error = None;
        for (index, sink) in self.sinks.iter().enumerate() {
            if let Err(e) = sink.record(entry).await {
                tracing::warn!(
                    asset_id = %entry.asset_id,
                    sink = index,
                    error = %e,
                    "Audit sink rejected entry"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rwaguard_core::{OwnershipVerification, ScoreCard};

    fn entry(asset_id: &str) -> AuditEntry {
        AuditEntry::from_verification(&OwnershipVerification::not_found(asset_id, Utc::now()))
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemoryAuditSink::new();
        sink.record(&entry("RWA-001")).await.unwrap();
        sink.record(&entry("RWA-002")).await.unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.entries_for("RWA-002").len(), 1);
    }

    #[tokio::test]
    async fn test_rejecting_sink() {
        let sink = MemoryAuditSink::new();
        sink.reject_writes(true);

        let verification = OwnershipVerification::from_card("RWA-001", ScoreCard::new(), Utc::now());
        let result = sink.record(&AuditEntry::from_verification(&verification)).await;

        assert!(matches!(result, Err(AuditError::WriteRejected(_))));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_fanout_writes_every_sink() {
        let healthy = Arc::new(MemoryAuditSink::new());
        let broken = Arc::new(MemoryAuditSink::new());
        broken.reject_writes(true);
        let fanout = FanoutAuditSink::new()
            .with_sink(broken.clone())
            .with_sink(healthy.clone());

        let result = fanout.record(&entry("RWA-001")).await;

        assert!(matches!(result, Err(AuditError::WriteRejected(_))));
        assert_eq!(healthy.len(), 1);
        assert!(broken.is_empty());
        assert_eq!(fanout.len(), 2);
    }
}

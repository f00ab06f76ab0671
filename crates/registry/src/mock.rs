//! Mock registry for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::client::OwnershipRegistry;
use crate::error::RegistryError;
use crate::types::RegistryRecord;

/// Registry with programmable records and failures
///
/// Records are keyed by registry reference; jurisdictions must be
/// registered explicitly so the missing-config path can be exercised.
#[derive(Default)]
pub struct MockRegistry {
    jurisdictions: RwLock<HashSet<String>>,
    records: RwLock<HashMap<String, RegistryRecord>>,
    failing: RwLock<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a jurisdiction as having a configured endpoint
    pub fn with_jurisdiction(self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdictions.write().unwrap().insert(jurisdiction.into());
        self
    }

    /// Record returned for `reference`
    pub fn set_record(&self, reference: impl Into<String>, record: RegistryRecord) {
        let mut records = self.records.write().unwrap();
        records.insert(reference.into(), record);
    }

    /// Make every fetch for this reference time out
    pub fn fail_reference(&self, reference: impl Into<String>) {
        self.failing.write().unwrap().insert(reference.into());
    }

    /// Number of fetches attempted
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OwnershipRegistry for MockRegistry {
    fn is_configured(&self, jurisdiction: &str) -> bool {
        self.jurisdictions.read().unwrap().contains(jurisdiction)
    }

    async fn fetch_record(
        &self,
        jurisdiction: &str,
        registry_reference: &str,
    ) -> Result<RegistryRecord, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.is_configured(jurisdiction) {
            return Err(RegistryError::NotConfigured(jurisdiction.to_string()));
        }
        if self.failing.read().unwrap().contains(registry_reference) {
            return Err(RegistryError::Timeout(15_000));
        }

        let records = self.records.read().unwrap();
        records
            .get(registry_reference)
            .cloned()
            .ok_or_else(|| RegistryError::Status {
                status: 404,
                reference: registry_reference.to_string(),
            })
    }
}

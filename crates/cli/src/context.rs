//! Application context - wires everything together

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rwaguard_audit::{FanoutAuditSink, JsonlAuditLedger};
use rwaguard_guard::{GuardConfig, OrchestratorBuilder, OwnershipVerificationOrchestrator};
use rwaguard_store::GuardDatabase;

/// Application context
///
/// Every verification is recorded twice: in the `compliance_decisions`
/// table and in the hash-chained JSONL ledger.
pub struct AppContext {
    pub db: GuardDatabase,
    pub ledger: Arc<JsonlAuditLedger>,
    pub config: GuardConfig,
    db_path: PathBuf,
}

impl AppContext {
    /// Open the database and ledger, load config then apply `RWAGUARD_*` overrides
    pub async fn new(
        db_path: impl AsRef<Path>,
        audit_log: impl AsRef<Path>,
        config_path: Option<&Path>,
    ) -> Result<Self, anyhow::Error> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut config = match config_path {
            Some(path) => GuardConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => GuardConfig::default(),
        };
        config.apply_env()?;

        let db = GuardDatabase::open(&db_path)
            .await
            .with_context(|| format!("opening database {}", db_path.display()))?;
        let ledger = JsonlAuditLedger::open(audit_log.as_ref())
            .with_context(|| format!("opening audit ledger {}", audit_log.as_ref().display()))?;

        tracing::debug!(db = %db_path.display(), ledger = %ledger.path().display(), "Context ready");

        Ok(Self {
            db,
            ledger: Arc::new(ledger),
            config,
            db_path,
        })
    }

    /// Builder with local storage wired in; evidence sources still unset
    pub fn builder(&self) -> OrchestratorBuilder {
        let audit = FanoutAuditSink::new()
            .with_sink(Arc::new(self.db.audit()))
            .with_sink(self.ledger.clone());

        OrchestratorBuilder::new(Arc::new(self.db.assets()))
            .with_config(self.config.clone())
            .with_transfers(Arc::new(self.db.transfers()))
            .with_audit_sink(Arc::new(audit))
    }

    /// Orchestrator over the configured registry endpoints and RPC node
    pub fn orchestrator(&self) -> Result<OwnershipVerificationOrchestrator, anyhow::Error> {
        Ok(self.builder().with_live_sources()?.build()?)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

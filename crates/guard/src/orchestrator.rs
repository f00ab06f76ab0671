//! Ownership verification orchestrator
//!
//! Fans out to the four sub-checks, folds their outcomes in a fixed order,
//! records the decision and raises an alert when action is recommended.
//! `verify_ownership` never fails: anything that escapes the per-check
//! handling becomes the fail-safe result.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, Weak};

use rwaguard_anomaly::{AnomalyDetector, TransferStore};
use rwaguard_audit::{AuditEntry, AuditSink, MemoryAuditSink};
use rwaguard_bus::{AlertPublisher, OwnershipAlert};
use rwaguard_chain::{
    ControlStateReader, EvmChainReader, JsonRpcClient, ProofOfReserveCheck, ReserveOracle, SpvControlCheck,
    SupplyReader,
};
use rwaguard_core::{AssetRepository, Clock, OwnershipVerification, ScoreCard, SystemClock};
use rwaguard_registry::{HttpRegistryClient, LandRegistryCheck, OwnershipRegistry};

use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};
use crate::scheduler::{panic_message, PollingScheduler};

type AssetLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Claim on one asset's verification mutex
///
/// The map entry is removed when the last lease for the asset is dropped,
/// so the map only holds assets with a verification running or waiting.
struct AssetLease<'a> {
    locks: &'a AssetLocks,
    asset_id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> AssetLease<'a> {
    fn acquire(locks: &'a AssetLocks, asset_id: &str) -> Self {
        let lock = locks.lock().unwrap().entry(asset_id.to_string()).or_default().clone();
        Self {
            locks,
            asset_id: asset_id.to_string(),
            lock,
        }
    }
}

impl Drop for AssetLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap();
        // Leases clone under the map lock, so the count is stable here
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.asset_id);
        }
    }
}

struct Inner {
    assets: Arc<dyn AssetRepository>,
    land_registry: LandRegistryCheck,
    reserves: ProofOfReserveCheck,
    control: SpvControlCheck,
    anomaly: AnomalyDetector,
    audit: Arc<dyn AuditSink>,
    alerts: AlertPublisher,
    clock: Arc<dyn Clock>,
    /// One async mutex per asset; verifications of an asset never overlap
    asset_locks: AssetLocks,
    scheduler: PollingScheduler,
    config: GuardConfig,
}

impl Inner {
    async fn verify(&self, asset_id: &str, spv_address: &str) -> OwnershipVerification {
        let lease = AssetLease::acquire(&self.asset_locks, asset_id);
        let _guard = lease.lock.lock().await;

        match AssertUnwindSafe(self.run_pipeline(asset_id, spv_address))
            .catch_unwind()
            .await
        {
            Ok(Ok(verification)) => verification,
            Ok(Err(e)) => {
                tracing::error!(asset_id = %asset_id, error = %e, "Verification failed, returning fail-safe result");
                OwnershipVerification::fail_safe(asset_id, &e.to_string(), self.clock.now())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(asset_id = %asset_id, panic = %reason, "Verification panicked, returning fail-safe result");
                OwnershipVerification::fail_safe(asset_id, &reason, self.clock.now())
            }
        }
    }

    async fn run_pipeline(&self, asset_id: &str, spv_address: &str) -> GuardResult<OwnershipVerification> {
        let now = self.clock.now();

        let Some(asset) = self.assets.find_asset(asset_id).await? else {
            tracing::warn!(asset_id = %asset_id, "Asset not found, escalating");
            return Ok(OwnershipVerification::not_found(asset_id, now));
        };

        let (registry, reserves, control, anomaly) = tokio::join!(
            self.land_registry.run(&asset, now),
            self.reserves.run(&asset),
            self.control.run(&asset, spv_address),
            self.anomaly.run(&asset, now),
        );

        let mut card = ScoreCard::new();
        for outcome in [registry, reserves, control, anomaly] {
            card.apply(outcome);
        }
        let verification = OwnershipVerification::from_card(asset_id, card, now);

        self.record(&verification).await;
        self.raise_alert(&verification);

        tracing::info!(
            asset_id = %asset_id,
            status = %verification.ownership_status,
            score = %verification.oracle_score,
            action = %verification.recommended_action,
            flags = verification.risk_flags.len(),
            "Ownership verification completed"
        );

        Ok(verification)
    }

    async fn record(&self, verification: &OwnershipVerification) {
        let entry = AuditEntry::from_verification(verification);
        if let Err(e) = self.audit.record(&entry).await {
            tracing::error!(
                asset_id = %verification.asset_id,
                entry_id = %entry.id,
                error = %e,
                "Failed to write audit entry"
            );
        }
    }

    fn raise_alert(&self, verification: &OwnershipVerification) {
        let Some(alert) = OwnershipAlert::from_verification(verification) else {
            return;
        };

        tracing::warn!(
            asset_id = %alert.asset_id,
            action = %alert.action,
            score = %alert.risk_score,
            irreversible = alert.is_irreversible(),
            "Ownership alert raised"
        );
        self.alerts.publish(alert);
    }
}

/// Entry point of the ownership guard
///
/// Cheap to clone; clones share checks, locks and polling tasks. Dropping
/// the last clone stops every polling task.
#[derive(Clone)]
pub struct OwnershipVerificationOrchestrator {
    inner: Arc<Inner>,
}

impl OwnershipVerificationOrchestrator {
    pub fn builder(assets: Arc<dyn AssetRepository>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(assets)
    }

    /// Verify one asset
    ///
    /// `spv_address` is the current controlling contract; empty means the
    /// asset's own `spv_contract_address`.
    pub async fn verify_ownership(&self, asset_id: &str, spv_address: &str) -> OwnershipVerification {
        self.inner.verify(asset_id, spv_address).await
    }

    /// Poll an asset every configured interval
    ///
    /// Schedules the recurring task (first tick one interval from now), then
    /// runs and returns one immediate verification. Returns `None` without
    /// verifying if the asset is already being polled.
    pub async fn start_continuous_polling(
        &self,
        asset_id: &str,
        spv_address: &str,
    ) -> Option<OwnershipVerification> {
        let interval = self.inner.config.polling_interval();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let tick_asset = asset_id.to_string();
        let tick_spv = spv_address.to_string();

        let scheduled = self.inner.scheduler.schedule(asset_id, interval, move || {
            let weak = weak.clone();
            let asset_id = tick_asset.clone();
            let spv_address = tick_spv.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.verify(&asset_id, &spv_address).await;
                }
            }
        });

        if !scheduled {
            tracing::info!(asset_id = %asset_id, "Already polling, ignoring start");
            return None;
        }

        tracing::info!(
            asset_id = %asset_id,
            interval_secs = interval.as_secs(),
            "Continuous polling started"
        );
        Some(self.inner.verify(asset_id, spv_address).await)
    }

    /// Stop polling an asset; `false` if it was not being polled
    pub fn stop_continuous_polling(&self, asset_id: &str) -> bool {
        let stopped = self.inner.scheduler.cancel(asset_id);
        if stopped {
            tracing::info!(asset_id = %asset_id, "Continuous polling stopped");
        }
        stopped
    }

    /// Stop polling every asset; returns how many were stopped
    pub fn stop_all_polling(&self) -> usize {
        let stopped = self.inner.scheduler.cancel_all();
        if stopped > 0 {
            tracing::info!(count = stopped, "All continuous polling stopped");
        }
        stopped
    }

    pub fn is_polling(&self, asset_id: &str) -> bool {
        self.inner.scheduler.is_scheduled(asset_id)
    }

    /// Assets currently polled, sorted
    pub fn polling_assets(&self) -> Vec<String> {
        self.inner.scheduler.scheduled_keys()
    }

    /// Publisher every raised alert goes through
    pub fn alerts(&self) -> &AlertPublisher {
        &self.inner.alerts
    }

    pub fn config(&self) -> &GuardConfig {
        &self.inner.config
    }
}

/// Builder for [`OwnershipVerificationOrchestrator`]
///
/// Registry, chain readers and transfer store are required. The audit sink
/// defaults to an in-memory sink, the clock to system time.
pub struct OrchestratorBuilder {
    assets: Arc<dyn AssetRepository>,
    config: GuardConfig,
    registry: Option<Arc<dyn OwnershipRegistry>>,
    reserve_oracle: Option<Arc<dyn ReserveOracle>>,
    supply: Option<Arc<dyn SupplyReader>>,
    control: Option<Arc<dyn ControlStateReader>>,
    transfers: Option<Arc<dyn TransferStore>>,
    audit: Option<Arc<dyn AuditSink>>,
    alerts: Option<AlertPublisher>,
    clock: Option<Arc<dyn Clock>>,
}

impl OrchestratorBuilder {
    pub fn new(assets: Arc<dyn AssetRepository>) -> Self {
        Self {
            assets,
            config: GuardConfig::default(),
            registry: None,
            reserve_oracle: None,
            supply: None,
            control: None,
            transfers: None,
            audit: None,
            alerts: None,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn OwnershipRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use one reader for reserves, supply and SPV control
    pub fn with_chain<T>(self, chain: Arc<T>) -> Self
    where
        T: ReserveOracle + SupplyReader + ControlStateReader + 'static,
    {
        self.with_reserve_oracle(chain.clone())
            .with_supply_reader(chain.clone())
            .with_control_reader(chain)
    }

    pub fn with_reserve_oracle(mut self, oracle: Arc<dyn ReserveOracle>) -> Self {
        self.reserve_oracle = Some(oracle);
        self
    }

    pub fn with_supply_reader(mut self, supply: Arc<dyn SupplyReader>) -> Self {
        self.supply = Some(supply);
        self
    }

    pub fn with_control_reader(mut self, control: Arc<dyn ControlStateReader>) -> Self {
        self.control = Some(control);
        self
    }

    /// Transfer history for the anomaly check
    pub fn with_transfers(mut self, transfers: Arc<dyn TransferStore>) -> Self {
        self.transfers = Some(transfers);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_alerts(mut self, alerts: AlertPublisher) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Clock stamped on results; tests pass a fixed one
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// HTTP registry and JSON-RPC chain reader from the current config
    ///
    /// Call after [`OrchestratorBuilder::with_config`].
    pub fn with_live_sources(self) -> GuardResult<Self> {
        let registry = HttpRegistryClient::new(self.config.registries.clone(), self.config.registry_timeout())?;
        let rpc = JsonRpcClient::new(self.config.rpc_url.clone(), self.config.chain_timeout())?;

        tracing::info!(
            rpc_url = %self.config.rpc_url,
            registries = self.config.registries.len(),
            "Live evidence sources configured"
        );

        Ok(self
            .with_registry(Arc::new(registry))
            .with_chain(Arc::new(EvmChainReader::new(rpc))))
    }

    /// Validate the config and assemble the checks
    pub fn build(self) -> GuardResult<OwnershipVerificationOrchestrator> {
        self.config.validate()?;

        let registry = self.registry.ok_or(GuardError::MissingComponent("ownership registry"))?;
        let reserve_oracle = self.reserve_oracle.ok_or(GuardError::MissingComponent("reserve oracle"))?;
        let supply = self.supply.ok_or(GuardError::MissingComponent("supply reader"))?;
        let control = self.control.ok_or(GuardError::MissingComponent("control state reader"))?;
        let transfers = self.transfers.ok_or(GuardError::MissingComponent("transfer store"))?;

        let config = self.config;
        let trust = config.trust;

        let inner = Inner {
            assets: self.assets,
            land_registry: LandRegistryCheck::new(registry, config.recent_change_window(), trust.land_registry),
            reserves: ProofOfReserveCheck::new(
                reserve_oracle,
                supply,
                config.reserve_oracles.clone(),
                trust.proof_of_reserve,
            ),
            control: SpvControlCheck::new(
                control,
                config.avg_block_time_secs,
                config.recent_change_window(),
                trust.spv_control,
            ),
            anomaly: AnomalyDetector::new(transfers, config.anomaly.clone(), trust.anomaly),
            audit: self.audit.unwrap_or_else(|| Arc::new(MemoryAuditSink::new())),
            alerts: self.alerts.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            asset_locks: Mutex::new(HashMap::new()),
            scheduler: PollingScheduler::new(),
            config,
        };

        Ok(OwnershipVerificationOrchestrator {
            inner: Arc::new(inner),
        })
    }
}

//! Land registry check

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use rwaguard_core::score::{REGISTRY_MISMATCH_PENALTY, REGISTRY_RECENT_CHANGE_PENALTY};
use rwaguard_core::{Asset, CheckKind, CheckOutcome, TrustPolicy};

use crate::client::OwnershipRegistry;
use crate::types::RegistryRecord;

const KIND: CheckKind = CheckKind::LandRegistry;

/// Compare a registry record against the SPV legal entity
///
/// - owner mismatch: `-0.5`
/// - owner matches but the record changed inside `recent_window`: `-0.2`
pub fn evaluate_record(
    record: &RegistryRecord,
    asset: &Asset,
    now: DateTime<Utc>,
    recent_window: Duration,
) -> CheckOutcome {
    if !record.is_owned_by(&asset.spv_legal_entity_id) {
        return CheckOutcome::failed(
            KIND,
            REGISTRY_MISMATCH_PENALTY,
            format!(
                "LAND_REGISTRY_MISMATCH: registry reports owner {}, expected {}",
                record.reported_owner(),
                asset.spv_legal_entity_id
            ),
        );
    }

    match record.last_modified_date {
        Some(modified) if now - modified < recent_window => CheckOutcome::failed(
            KIND,
            REGISTRY_RECENT_CHANGE_PENALTY,
            format!(
                "LAND_REGISTRY_RECENT_CHANGE: record modified {}",
                modified.format("%Y-%m-%d")
            ),
        ),
        _ => CheckOutcome::passed(KIND),
    }
}

/// Off-chain ownership check against the jurisdiction's land registry
pub struct LandRegistryCheck {
    registry: Arc<dyn OwnershipRegistry>,
    recent_window: Duration,
    policy: TrustPolicy,
}

impl LandRegistryCheck {
    pub fn new(registry: Arc<dyn OwnershipRegistry>, recent_window: Duration, policy: TrustPolicy) -> Self {
        Self {
            registry,
            recent_window,
            policy,
        }
    }

    /// Run the check; errors are folded into the outcome per the trust policy
    pub async fn run(&self, asset: &Asset, now: DateTime<Utc>) -> CheckOutcome {
        if !self.registry.is_configured(&asset.jurisdiction) {
            tracing::debug!(
                asset_id = %asset.asset_id,
                jurisdiction = %asset.jurisdiction,
                "No land registry for jurisdiction"
            );
            return CheckOutcome::not_configured(
                KIND,
                &self.policy,
                &format!("jurisdiction {}", asset.jurisdiction),
            );
        }

        match self
            .registry
            .fetch_record(&asset.jurisdiction, &asset.registry_reference)
            .await
        {
            Ok(record) => {
                let outcome = evaluate_record(&record, asset, now, self.recent_window);
                tracing::debug!(
                    asset_id = %asset.asset_id,
                    status = ?record.status,
                    penalty = %outcome.penalty,
                    "Land registry check completed"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    error = %e,
                    "Land registry check unavailable"
                );
                CheckOutcome::read_failed(KIND, &self.policy, &e)
            }
        }
    }
}

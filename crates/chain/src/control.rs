//! SPV control-transfer check

use chrono::Duration;
use std::sync::Arc;

use rwaguard_core::score::{CONTROL_LOST_PENALTY, CONTROL_RECENT_TRANSFER_PENALTY};
use rwaguard_core::{Asset, CheckKind, CheckOutcome, TrustPolicy};

use crate::error::ChainError;
use crate::reader::ControlStateReader;

const KIND: CheckKind = CheckKind::SpvControl;

/// Snapshot of the controlling contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub has_control: bool,
    /// 0 when control was never transferred
    pub last_transfer_block: u64,
    pub current_block: u64,
}

/// Score a live controller
///
/// A recent transfer (`-0.15`) takes precedence over lost control (`-0.4`);
/// the two are never charged together.
pub fn evaluate_control(
    contract: &str,
    state: &ControlState,
    avg_block_time_secs: u64,
    recent_window: Duration,
) -> CheckOutcome {
    if state.last_transfer_block > 0 {
        let blocks_ago = state.current_block.saturating_sub(state.last_transfer_block);
        let elapsed_secs = blocks_ago.saturating_mul(avg_block_time_secs);
        let elapsed = Duration::seconds(i64::try_from(elapsed_secs).unwrap_or(i64::MAX));

        if elapsed < recent_window {
            return CheckOutcome::failed(
                KIND,
                CONTROL_RECENT_TRANSFER_PENALTY,
                format!(
                    "SPV_CONTROL_RECENT_TRANSFER: control of {} transferred {} blocks ago (~{}h)",
                    contract,
                    blocks_ago,
                    elapsed.num_hours()
                ),
            );
        }
    }

    if !state.has_control {
        return CheckOutcome::failed(
            KIND,
            CONTROL_LOST_PENALTY,
            format!("SPV_CONTROL_LOST: {} reports SPV no longer in control", contract),
        );
    }

    CheckOutcome::passed(KIND)
}

/// On-chain control state of the SPV contract
pub struct SpvControlCheck {
    reader: Arc<dyn ControlStateReader>,
    avg_block_time_secs: u64,
    recent_window: Duration,
    policy: TrustPolicy,
}

impl SpvControlCheck {
    pub fn new(
        reader: Arc<dyn ControlStateReader>,
        avg_block_time_secs: u64,
        recent_window: Duration,
        policy: TrustPolicy,
    ) -> Self {
        Self {
            reader,
            avg_block_time_secs,
            recent_window,
            policy,
        }
    }

    async fn inspect(&self, contract: &str) -> Result<CheckOutcome, ChainError> {
        if !self.reader.has_code(contract).await? {
            return Ok(CheckOutcome::failed(
                KIND,
                CONTROL_LOST_PENALTY,
                format!("SPV_CONTROL_LOST: contract destroyed, no bytecode at {}", contract),
            ));
        }

        let (has_control, last_transfer_block, current_block) = tokio::try_join!(
            self.reader.has_control(contract),
            self.reader.last_control_transfer(contract),
            self.reader.current_block(),
        )?;

        let state = ControlState {
            has_control,
            last_transfer_block,
            current_block,
        };
        Ok(evaluate_control(
            contract,
            &state,
            self.avg_block_time_secs,
            self.recent_window,
        ))
    }

    /// Run against `spv_address`, falling back to the asset's SPV contract
    pub async fn run(&self, asset: &Asset, spv_address: &str) -> CheckOutcome {
        let contract = if spv_address.is_empty() {
            asset.spv_contract_address.as_str()
        } else {
            spv_address
        };
        if contract.is_empty() {
            return CheckOutcome::not_configured(KIND, &self.policy, "no SPV contract address");
        }

        match self.inspect(contract).await {
            Ok(outcome) => {
                tracing::debug!(
                    asset_id = %asset.asset_id,
                    contract,
                    penalty = %outcome.penalty,
                    "SPV control check completed"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    contract,
                    error = %e,
                    "SPV control check unavailable, defaulting to has-control"
                );
                CheckOutcome::read_failed(KIND, &self.policy, &e)
            }
        }
    }
}

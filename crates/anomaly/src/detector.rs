//! Transaction anomaly check

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use rwaguard_core::score::ANOMALY_PENALTY;
use rwaguard_core::{Asset, CheckKind, CheckOutcome, TrustPolicy};

use crate::error::{AnomalyError, AnomalyResult};
use crate::store::{HistoricalBaseline, TransferStore, WindowAggregate};
use crate::thresholds::AnomalyThresholds;

const KIND: CheckKind = CheckKind::Anomaly;

/// Evaluate every anomaly condition and return one flag per condition fired
///
/// A missing or zero baseline disables only the condition that needs it.
/// Fails with `InvalidData` if a threshold limit overflows.
pub fn evaluate_activity(
    window: &WindowAggregate,
    baseline: &HistoricalBaseline,
    total_supply: Option<Decimal>,
    thresholds: &AnomalyThresholds,
) -> AnomalyResult<Vec<String>> {
    let mut flags = Vec::new();

    if window.tx_count > thresholds.max_tx_count {
        flags.push(format!(
            "ANOMALY_HIGH_TX_COUNT: {} transfers in {}h exceeds {}",
            window.tx_count, thresholds.window_hours, thresholds.max_tx_count
        ));
    }

    if let Some(avg_daily) = baseline.avg_daily_volume.filter(|v| v.is_sign_positive() && !v.is_zero()) {
        if window.total_volume > limit(avg_daily, thresholds.volume_spike_multiplier, "volume spike")? {
            flags.push(format!(
                "ANOMALY_VOLUME_SPIKE: volume {} exceeds {}x average daily volume {}",
                window.total_volume.normalize(),
                thresholds.volume_spike_multiplier.normalize(),
                avg_daily.round_dp(4).normalize()
            ));
        }
    }

    if let (Some(price), Some(avg_price)) = (window.avg_price, baseline.avg_price) {
        if !avg_price.is_zero() && price < limit(avg_price, thresholds.price_drop_ratio, "price drop")? {
            flags.push(format!(
                "ANOMALY_PRICE_DROP: average price {} below {}% of baseline {}",
                price.round_dp(4).normalize(),
                thresholds.price_drop_ratio.saturating_mul(Decimal::ONE_HUNDRED).normalize(),
                avg_price.round_dp(4).normalize()
            ));
        }
    }

    if let Some(supply) = total_supply.filter(|s| !s.is_zero()) {
        if window.max_single_transfer > limit(supply, thresholds.whale_supply_fraction, "whale transfer")? {
            flags.push(format!(
                "ANOMALY_WHALE_TRANSFER: single transfer {} exceeds {}% of supply {}",
                window.max_single_transfer.normalize(),
                thresholds.whale_supply_fraction.saturating_mul(Decimal::ONE_HUNDRED).normalize(),
                supply.normalize()
            ));
        }
    }

    Ok(flags)
}

fn limit(base: Decimal, factor: Decimal, condition: &str) -> AnomalyResult<Decimal> {
    base.checked_mul(factor)
        .ok_or_else(|| AnomalyError::InvalidData(format!("{} limit overflows", condition)))
}

/// Recent transfer activity vs historical baseline
pub struct AnomalyDetector {
    store: Arc<dyn TransferStore>,
    thresholds: AnomalyThresholds,
    policy: TrustPolicy,
}

impl AnomalyDetector {
    pub fn new(store: Arc<dyn TransferStore>, thresholds: AnomalyThresholds, policy: TrustPolicy) -> Self {
        Self {
            store,
            thresholds,
            policy,
        }
    }

    pub fn thresholds(&self) -> &AnomalyThresholds {
        &self.thresholds
    }

    async fn inspect(&self, asset: &Asset, now: DateTime<Utc>) -> AnomalyResult<Vec<String>> {
        let window_start = self.thresholds.window_start(now)?;
        let (window, baseline) = tokio::try_join!(
            self.store.window_aggregate(&asset.asset_id, window_start),
            self.store
                .historical_baseline(&asset.asset_id, window_start, self.thresholds.baseline_days),
        )?;

        evaluate_activity(&window, &baseline, asset.total_token_supply, &self.thresholds)
    }

    /// Run the check; store and arithmetic failures go through the trust policy
    pub async fn run(&self, asset: &Asset, now: DateTime<Utc>) -> CheckOutcome {
        match self.inspect(asset, now).await {
            Ok(flags) if flags.is_empty() => CheckOutcome::passed(KIND),
            Ok(flags) => {
                tracing::debug!(
                    asset_id = %asset.asset_id,
                    conditions = flags.len(),
                    "Transaction anomalies detected"
                );
                CheckOutcome {
                    kind: KIND,
                    executed: true,
                    penalty: ANOMALY_PENALTY,
                    flags,
                }
            }
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    error = %e,
                    "Anomaly check unavailable"
                );
                CheckOutcome::read_failed(KIND, &self.policy, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryTransferStore, TransferRecord};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use rwaguard_core::TrustAction;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn asset(supply: Option<Decimal>) -> Asset {
        Asset {
            asset_id: "RWA-001".to_string(),
            jurisdiction: "UK".to_string(),
            spv_legal_entity_id: "SPV-LTD-42".to_string(),
            spv_contract_address: "0x00000000000000000000000000000000000000aa".to_string(),
            registry_reference: "TITLE-123".to_string(),
            reserve_oracle_address: None,
            token_contract_address: None,
            total_token_supply: supply,
        }
    }

    fn transfer(amount: Decimal, price: Decimal, hours_ago: i64) -> TransferRecord {
        TransferRecord {
            asset_id: "RWA-001".to_string(),
            amount,
            price: Some(price),
            timestamp: now() - Duration::hours(hours_ago),
        }
    }

    fn window(tx_count: u64, volume: Decimal, price: Option<Decimal>, max: Decimal) -> WindowAggregate {
        WindowAggregate {
            tx_count,
            total_volume: volume,
            avg_price: price,
            max_single_transfer: max,
        }
    }

    fn baseline(volume: Decimal, price: Decimal) -> HistoricalBaseline {
        HistoricalBaseline {
            avg_daily_volume: Some(volume),
            avg_price: Some(price),
        }
    }

    #[test]
    fn test_quiet_activity() {
        let flags = evaluate_activity(
            &window(10, dec!(100), Some(dec!(95)), dec!(20)),
            &baseline(dec!(100), dec!(100)),
            Some(dec!(1000)),
            &AnomalyThresholds::default(),
        )
        .unwrap();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_each_condition_flags_independently() {
        let flags = evaluate_activity(
            &window(101, dec!(501), Some(dec!(69)), dec!(101)),
            &baseline(dec!(100), dec!(100)),
            Some(dec!(1000)),
            &AnomalyThresholds::default(),
        )
        .unwrap();

        assert_eq!(flags.len(), 4);
        assert!(flags[0].starts_with("ANOMALY_HIGH_TX_COUNT"));
        assert!(flags[1].starts_with("ANOMALY_VOLUME_SPIKE"));
        assert!(flags[2].starts_with("ANOMALY_PRICE_DROP"));
        assert!(flags[3].starts_with("ANOMALY_WHALE_TRANSFER"));
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let flags = evaluate_activity(
            &window(100, dec!(500), Some(dec!(70)), dec!(100)),
            &baseline(dec!(100), dec!(100)),
            Some(dec!(1000)),
            &AnomalyThresholds::default(),
        )
        .unwrap();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_missing_baselines_disable_their_conditions() {
        let flags = evaluate_activity(
            &window(5, dec!(1_000_000), Some(dec!(1)), dec!(1_000_000)),
            &HistoricalBaseline::default(),
            None,
            &AnomalyThresholds::default(),
        )
        .unwrap();
        assert!(flags.is_empty());

        let zero = evaluate_activity(
            &window(5, dec!(1_000_000), Some(dec!(1)), dec!(1_000_000)),
            &baseline(dec!(0), dec!(0)),
            Some(dec!(0)),
            &AnomalyThresholds::default(),
        )
        .unwrap();
        assert!(zero.is_empty());
    }

    #[test]
    fn test_limit_overflow_is_an_error() {
        let thresholds = AnomalyThresholds {
            volume_spike_multiplier: dec!(1000),
            ..Default::default()
        };
        let result = evaluate_activity(
            &window(1, dec!(1), None, dec!(1)),
            &baseline(Decimal::MAX, dec!(1)),
            None,
            &thresholds,
        );
        assert!(matches!(result, Err(AnomalyError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_volume_past_decimal_max_reports_unavailable() {
        let half = Decimal::MAX / dec!(2) + Decimal::ONE;
        let store = Arc::new(InMemoryTransferStore::new());
        store.record(transfer(half, dec!(100), 1));
        store.record(transfer(half, dec!(100), 2));

        let detector = AnomalyDetector::new(store, AnomalyThresholds::default(), TrustPolicy::trusting());
        let outcome = detector.run(&asset(Some(dec!(1000))), now()).await;

        assert!(!outcome.executed);
        assert!(outcome.penalty.is_zero());
        assert!(outcome.flags[0].starts_with("ANOMALY_CHECK_UNAVAILABLE"));
    }

    #[tokio::test]
    async fn test_flat_penalty_for_multiple_conditions() {
        let store = Arc::new(InMemoryTransferStore::new());
        store.record(transfer(dec!(10), dec!(100), 24 * 5));
        store.record(transfer(dec!(400), dec!(50), 2));

        let detector = AnomalyDetector::new(store, AnomalyThresholds::default(), TrustPolicy::trusting());
        let outcome = detector.run(&asset(Some(dec!(1000))), now()).await;

        assert!(outcome.executed);
        assert_eq!(outcome.penalty, dec!(0.2));
        assert_eq!(outcome.flags.len(), 3);
    }

    #[tokio::test]
    async fn test_no_history_passes() {
        let store = Arc::new(InMemoryTransferStore::new());
        let detector = AnomalyDetector::new(store, AnomalyThresholds::default(), TrustPolicy::trusting());

        let outcome = detector.run(&asset(None), now()).await;
        assert!(outcome.is_clean());
        assert!(outcome.executed);
    }

    #[tokio::test]
    async fn test_store_failure() {
        let store = Arc::new(InMemoryTransferStore::new());
        store.set_unavailable(true);

        let trusting = AnomalyDetector::new(store.clone(), AnomalyThresholds::default(), TrustPolicy::trusting());
        let outcome = trusting.run(&asset(None), now()).await;
        assert!(!outcome.executed);
        assert!(outcome.penalty.is_zero());
        assert!(outcome.flags[0].starts_with("ANOMALY_CHECK_UNAVAILABLE"));

        let penalizing = AnomalyDetector::new(
            store,
            AnomalyThresholds::default(),
            TrustPolicy::new(TrustAction::Skip, TrustAction::Penalize),
        );
        assert_eq!(penalizing.run(&asset(None), now()).await.penalty, dec!(0.1));
    }
}

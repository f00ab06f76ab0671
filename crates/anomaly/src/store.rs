//! Transfer ledger store port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::{AnomalyError, AnomalyResult};
use crate::thresholds::baseline_start;

/// One token transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub asset_id: String,
    pub amount: Decimal,
    /// Unit price paid, when the transfer was a trade
    pub price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates over the recent-activity window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAggregate {
    pub tx_count: u64,
    pub total_volume: Decimal,
    /// `None` when no priced transfer happened in the window
    pub avg_price: Option<Decimal>,
    pub max_single_transfer: Decimal,
}

impl WindowAggregate {
    /// Fails with `InvalidData` if the volume or price sum overflows
    pub fn from_transfers(transfers: &[TransferRecord]) -> AnomalyResult<Self> {
        Ok(Self {
            tx_count: transfers.len() as u64,
            total_volume: checked_sum(transfers.iter().map(|t| t.amount), "window volume")?,
            avg_price: average(transfers.iter().filter_map(|t| t.price), "window price")?,
            max_single_transfer: transfers.iter().map(|t| t.amount).max().unwrap_or(Decimal::ZERO),
        })
    }
}

/// Historical baseline; `None` means no history to compare against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalBaseline {
    pub avg_daily_volume: Option<Decimal>,
    pub avg_price: Option<Decimal>,
}

impl HistoricalBaseline {
    /// Baseline of transfers spread over `days` days
    pub fn from_transfers(transfers: &[TransferRecord], days: i64) -> AnomalyResult<Self> {
        if days <= 0 {
            return Err(AnomalyError::InvalidData(format!("baseline of {} days", days)));
        }
        if transfers.is_empty() {
            return Ok(Self::default());
        }

        let total = checked_sum(transfers.iter().map(|t| t.amount), "baseline volume")?;
        Ok(Self {
            avg_daily_volume: Some(total / Decimal::from(days)),
            avg_price: average(transfers.iter().filter_map(|t| t.price), "baseline price")?,
        })
    }
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Aggregates of transfers with `since <= timestamp`
    async fn window_aggregate(&self, asset_id: &str, since: DateTime<Utc>) -> AnomalyResult<WindowAggregate>;

    /// Baseline over `days` days ending at `until` (exclusive)
    async fn historical_baseline(
        &self,
        asset_id: &str,
        until: DateTime<Utc>,
        days: i64,
    ) -> AnomalyResult<HistoricalBaseline>;
}

/// In-memory transfer ledger (tests, local runs)
#[derive(Debug, Default)]
pub struct InMemoryTransferStore {
    transfers: RwLock<Vec<TransferRecord>>,
    unavailable: RwLock<bool>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one transfer
    pub fn record(&self, transfer: TransferRecord) {
        self.transfers.write().unwrap().push(transfer);
    }

    pub fn record_all(&self, transfers: impl IntoIterator<Item = TransferRecord>) {
        self.transfers.write().unwrap().extend(transfers);
    }

    /// Simulate an outage: every query fails until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap() = unavailable;
    }

    pub fn len(&self) -> usize {
        self.transfers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> AnomalyResult<()> {
        if *self.unavailable.read().unwrap() {
            return Err(AnomalyError::StoreUnavailable("transfer store offline".to_string()));
        }
        Ok(())
    }

    fn select(&self, asset_id: &str, from: DateTime<Utc>, until: Option<DateTime<Utc>>) -> Vec<TransferRecord> {
        let transfers = self.transfers.read().unwrap();
        transfers
            .iter()
            .filter(|t| t.asset_id == asset_id && t.timestamp >= from)
            .filter(|t| until.map_or(true, |until| t.timestamp < until))
            .cloned()
            .collect()
    }
}

fn overflow(what: &str) -> AnomalyError {
    AnomalyError::InvalidData(format!("{} overflows", what))
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>, what: &str) -> AnomalyResult<Decimal> {
    values
        .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(v))
        .ok_or_else(|| overflow(what))
}

fn average(mut values: impl Iterator<Item = Decimal>, what: &str) -> AnomalyResult<Option<Decimal>> {
    let (sum, count) = values
        .try_fold((Decimal::ZERO, 0u64), |(sum, count), v| Some((sum.checked_add(v)?, count + 1)))
        .ok_or_else(|| overflow(what))?;
    Ok((count > 0).then(|| sum / Decimal::from(count)))
}

#[async_trait]
impl TransferStore for InMemoryTransferStore {
    async fn window_aggregate(&self, asset_id: &str, since: DateTime<Utc>) -> AnomalyResult<WindowAggregate> {
        self.check_available()?;
        WindowAggregate::from_transfers(&self.select(asset_id, since, None))
    }

    async fn historical_baseline(
        &self,
        asset_id: &str,
        until: DateTime<Utc>,
        days: i64,
    ) -> AnomalyResult<HistoricalBaseline> {
        self.check_available()?;
        let history = self.select(asset_id, baseline_start(until, days)?, Some(until));
        HistoricalBaseline::from_transfers(&history, days)
    }
}

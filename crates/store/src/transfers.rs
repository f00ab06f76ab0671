//! Token transfer ledger table

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use rwaguard_anomaly::{
    baseline_start, AnomalyError, AnomalyResult, HistoricalBaseline, TransferRecord, TransferStore,
    WindowAggregate,
};

use crate::error::{StoreError, StoreResult};

const TABLE: &str = "token_transfers";

/// Fixed-width UTC timestamps so text comparison orders by time
fn timestamp_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Transfer ledger over `token_transfers`
///
/// Amounts and prices are stored as decimal text and aggregated in Rust to
/// keep exact arithmetic.
#[derive(Clone)]
pub struct SqliteTransferStore {
    pool: SqlitePool,
}

impl SqliteTransferStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `transfers` table and its index if missing
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS token_transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                price TEXT,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_token_transfers_asset_time
            ON token_transfers(asset_id, timestamp)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert(&self, transfer: &TransferRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO token_transfers (asset_id, amount, price, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&transfer.asset_id)
        .bind(transfer.amount.to_string())
        .bind(transfer.price.map(|p| p.to_string()))
        .bind(timestamp_key(transfer.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Transfers with `from <= timestamp`, and `timestamp < until` when bounded
    pub async fn transfers_between(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<TransferRecord>> {
        let until = until.map(timestamp_key);
        let rows = sqlx::query(
            r#"
            SELECT asset_id, amount, price, timestamp
            FROM token_transfers
            WHERE asset_id = ? AND timestamp >= ? AND (? IS NULL OR timestamp < ?)
            ORDER BY timestamp
            "#,
        )
        .bind(asset_id)
        .bind(timestamp_key(from))
        .bind(&until)
        .bind(&until)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transfer_from_row).collect()
    }
}

fn parse_decimal(raw: &str) -> StoreResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| StoreError::corrupt(TABLE, format!("{}: {}", raw, e)))
}

fn transfer_from_row(row: &SqliteRow) -> StoreResult<TransferRecord> {
    let timestamp: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| StoreError::corrupt(TABLE, e))?
        .with_timezone(&Utc);

    Ok(TransferRecord {
        asset_id: row.try_get("asset_id")?,
        amount: parse_decimal(&row.try_get::<String, _>("amount")?)?,
        price: row
            .try_get::<Option<String>, _>("price")?
            .as_deref()
            .map(parse_decimal)
            .transpose()?,
        timestamp,
    })
}

fn query_error(e: StoreError) -> AnomalyError {
    AnomalyError::Query(e.to_string())
}

#[async_trait]
impl TransferStore for SqliteTransferStore {
    async fn window_aggregate(&self, asset_id: &str, since: DateTime<Utc>) -> AnomalyResult<WindowAggregate> {
        let window = self
            .transfers_between(asset_id, since, None)
            .await
            .map_err(query_error)?;
        WindowAggregate::from_transfers(&window)
    }

    async fn historical_baseline(
        &self,
        asset_id: &str,
        until: DateTime<Utc>,
        days: i64,
    ) -> AnomalyResult<HistoricalBaseline> {
        let history = self
            .transfers_between(asset_id, baseline_start(until, days)?, Some(until))
            .await
            .map_err(query_error)?;
        HistoricalBaseline::from_transfers(&history, days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GuardDatabase;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn transfer(amount: Decimal, price: Option<Decimal>, hours_ago: i64) -> TransferRecord {
        TransferRecord {
            asset_id: "RWA-001".to_string(),
            amount,
            price,
            timestamp: now() - Duration::hours(hours_ago),
        }
    }

    #[test]
    fn test_timestamp_key_orders_lexically() {
        let early = timestamp_key(now() - Duration::hours(1));
        let late = timestamp_key(now());
        assert!(early < late);
        assert_eq!(late, "2026-03-01T12:00:00.000000Z");
    }

    #[tokio::test]
    async fn test_window_and_baseline() {
        let db = GuardDatabase::in_memory().await.unwrap();
        let store = db.transfers();
        for t in [
            transfer(dec!(10.5), Some(dec!(100)), 1),
            transfer(dec!(30), Some(dec!(80)), 2),
            transfer(dec!(300), Some(dec!(100)), 48),
            transfer(dec!(300), Some(dec!(120)), 24 * 10),
            transfer(dec!(999), None, 24 * 40),
        ] {
            store.insert(&t).await.unwrap();
        }

        let window_start = now() - Duration::hours(24);
        let window = store.window_aggregate("RWA-001", window_start).await.unwrap();
        assert_eq!(window.tx_count, 2);
        assert_eq!(window.total_volume, dec!(40.5));
        assert_eq!(window.avg_price, Some(dec!(90)));
        assert_eq!(window.max_single_transfer, dec!(30));

        let baseline = store.historical_baseline("RWA-001", window_start, 30).await.unwrap();
        assert_eq!(baseline.avg_daily_volume, Some(dec!(20)));
        assert_eq!(baseline.avg_price, Some(dec!(110)));
    }

    #[tokio::test]
    async fn test_other_assets_ignored() {
        let db = GuardDatabase::in_memory().await.unwrap();
        let store = db.transfers();
        let mut other = transfer(dec!(5), None, 1);
        other.asset_id = "RWA-002".to_string();
        store.insert(&other).await.unwrap();

        let window = store
            .window_aggregate("RWA-001", now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(window, WindowAggregate::default());
    }
}

//! Audit decisions table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use rwaguard_audit::{AuditEntry, AuditError, AuditResult, AuditSink};
use rwaguard_core::{OracleScore, OwnershipStatus};

use crate::error::{StoreError, StoreResult};

const TABLE: &str = "compliance_decisions";

/// Audit sink over `compliance_decisions`
///
/// Insert-only: no update or delete statement exists for this table.
#[derive(Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `compliance_decisions` table if missing
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS compliance_decisions (
                id TEXT PRIMARY KEY,
                asset_id TEXT NOT NULL,
                decision_type TEXT NOT NULL,
                decision TEXT NOT NULL,
                risk_score TEXT NOT NULL,
                reasoning TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_compliance_decisions_asset
            ON compliance_decisions(asset_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert(&self, entry: &AuditEntry) -> StoreResult<()> {
        let reasoning =
            serde_json::to_string(&entry.reasoning).map_err(|e| StoreError::corrupt(TABLE, e))?;

        sqlx::query(
            r#"
            INSERT INTO compliance_decisions
            (id, asset_id, decision_type, decision, risk_score, reasoning, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.asset_id)
        .bind(&entry.decision_type)
        .bind(entry.decision.to_string())
        .bind(entry.risk_score.to_string())
        .bind(reasoning)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Decisions for one asset, oldest first
    pub async fn entries_for(&self, asset_id: &str) -> StoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, decision_type, decision, risk_score, reasoning, created_at
            FROM compliance_decisions
            WHERE asset_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM compliance_decisions")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<AuditEntry> {
    let id: String = row.try_get("id")?;
    let decision: String = row.try_get("decision")?;
    let risk_score: String = row.try_get("risk_score")?;
    let reasoning: String = row.try_get("reasoning")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(AuditEntry {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::corrupt(TABLE, e))?,
        asset_id: row.try_get("asset_id")?,
        decision_type: row.try_get("decision_type")?,
        decision: OwnershipStatus::from_str(&decision).map_err(|e| StoreError::corrupt(TABLE, e))?,
        risk_score: OracleScore::clamped(
            Decimal::from_str(&risk_score).map_err(|e| StoreError::corrupt(TABLE, e))?,
        ),
        reasoning: serde_json::from_str(&reasoning).map_err(|e| StoreError::corrupt(TABLE, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::corrupt(TABLE, e))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        self.insert(entry)
            .await
            .map_err(|e| AuditError::WriteRejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::GuardDatabase;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use rwaguard_audit::{AuditEntry, AuditSink};
    use rwaguard_core::{CheckKind, CheckOutcome, OwnershipStatus, OwnershipVerification, ScoreCard};

    fn entry(asset_id: &str) -> AuditEntry {
        let mut card = ScoreCard::new();
        card.apply(CheckOutcome::failed(CheckKind::ProofOfReserve, dec!(0.3), "PROOF_OF_RESERVE_SHORTFALL: x"));
        AuditEntry::from_verification(&OwnershipVerification::from_card(asset_id, card, Utc::now()))
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let db = GuardDatabase::in_memory().await.unwrap();
        let sink = db.audit();

        let written = entry("RWA-001");
        sink.record(&written).await.unwrap();
        sink.record(&entry("RWA-002")).await.unwrap();

        let entries = sink.entries_for("RWA-001").await.unwrap();
        assert_eq!(entries, vec![written]);
        assert_eq!(entries[0].decision, OwnershipStatus::Valid);
        assert_eq!(entries[0].risk_score.value(), dec!(0.7));
        assert_eq!(sink.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = GuardDatabase::in_memory().await.unwrap();
        let sink = db.audit();
        let written = entry("RWA-001");

        sink.record(&written).await.unwrap();
        assert!(sink.record(&written).await.is_err());
        assert_eq!(sink.count().await.unwrap(), 1);
    }
}

//! Asset metadata table

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use rwaguard_core::{Asset, AssetRepository, CoreError, CoreResult};

use crate::error::{StoreError, StoreResult};

const TABLE: &str = "rwa_assets";

/// Asset repository over `rwa_assets`
///
/// Registration is owned elsewhere; [`SqliteAssetRepository::upsert`] exists
/// for operators seeding a local database.
#[derive(Clone)]
pub struct SqliteAssetRepository {
    pool: SqlitePool,
}

impl SqliteAssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `assets` table if missing
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rwa_assets (
                asset_id TEXT PRIMARY KEY,
                jurisdiction TEXT NOT NULL,
                spv_legal_entity_id TEXT NOT NULL,
                spv_contract_address TEXT NOT NULL,
                registry_reference TEXT NOT NULL,
                reserve_oracle_address TEXT,
                token_contract_address TEXT,
                total_token_supply TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace by `asset_id`
    pub async fn upsert(&self, asset: &Asset) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO rwa_assets
            (asset_id, jurisdiction, spv_legal_entity_id, spv_contract_address,
             registry_reference, reserve_oracle_address, token_contract_address, total_token_supply)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&asset.asset_id)
        .bind(&asset.jurisdiction)
        .bind(&asset.spv_legal_entity_id)
        .bind(&asset.spv_contract_address)
        .bind(&asset.registry_reference)
        .bind(&asset.reserve_oracle_address)
        .bind(&asset.token_contract_address)
        .bind(asset.total_token_supply.map(|s| s.to_string()))
        .execute(&self.pool)
        .await?;

        tracing::info!(asset_id = %asset.asset_id, "Asset registered");
        Ok(())
    }

    pub async fn find(&self, asset_id: &str) -> StoreResult<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT asset_id, jurisdiction, spv_legal_entity_id, spv_contract_address,
                   registry_reference, reserve_oracle_address, token_contract_address, total_token_supply
            FROM rwa_assets
            WHERE asset_id = ?
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| asset_from_row(&row)).transpose()
    }

    /// All asset ids, sorted
    pub async fn list_ids(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT asset_id FROM rwa_assets ORDER BY asset_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("asset_id").map_err(StoreError::from))
            .collect()
    }
}

fn asset_from_row(row: &SqliteRow) -> StoreResult<Asset> {
    let total_token_supply = row
        .try_get::<Option<String>, _>("total_token_supply")?
        .map(|raw| Decimal::from_str(&raw).map_err(|e| StoreError::corrupt(TABLE, e)))
        .transpose()?;

    Ok(Asset {
        asset_id: row.try_get("asset_id")?,
        jurisdiction: row.try_get("jurisdiction")?,
        spv_legal_entity_id: row.try_get("spv_legal_entity_id")?,
        spv_contract_address: row.try_get("spv_contract_address")?,
        registry_reference: row.try_get("registry_reference")?,
        reserve_oracle_address: row.try_get("reserve_oracle_address")?,
        token_contract_address: row.try_get("token_contract_address")?,
        total_token_supply,
    })
}

#[async_trait]
impl AssetRepository for SqliteAssetRepository {
    async fn find_asset(&self, asset_id: &str) -> CoreResult<Option<Asset>> {
        self.find(asset_id)
            .await
            .map_err(|e| CoreError::Repository(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::GuardDatabase;
    use rust_decimal_macros::dec;
    use rwaguard_core::{Asset, AssetRepository};
    use tempfile::tempdir;

    fn asset() -> Asset {
        Asset {
            asset_id: "RWA-001".to_string(),
            jurisdiction: "UK".to_string(),
            spv_legal_entity_id: "SPV-LTD-42".to_string(),
            spv_contract_address: "0x00000000000000000000000000000000000000aa".to_string(),
            registry_reference: "TITLE-123".to_string(),
            reserve_oracle_address: Some("0x00000000000000000000000000000000000000f1".to_string()),
            token_contract_address: None,
            total_token_supply: Some(dec!(1000000)),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let dir = tempdir().unwrap();
        let db = GuardDatabase::open(dir.path().join("guard.db")).await.unwrap();
        let repo = db.assets();

        repo.upsert(&asset()).await.unwrap();

        let found = repo.find_asset("RWA-001").await.unwrap().unwrap();
        assert_eq!(found, asset());
        assert!(repo.find_asset("RWA-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = GuardDatabase::in_memory().await.unwrap();
        let repo = db.assets();
        repo.upsert(&asset()).await.unwrap();

        let mut moved = asset();
        moved.jurisdiction = "US-NY".to_string();
        repo.upsert(&moved).await.unwrap();

        assert_eq!(repo.list_ids().await.unwrap(), vec!["RWA-001".to_string()]);
        assert_eq!(repo.find("RWA-001").await.unwrap().unwrap().jurisdiction, "US-NY");
    }
}

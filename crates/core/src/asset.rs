//! Asset metadata and repository port
//!
//! Assets are owned by the registration subsystem; the guard only reads them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::CoreResult;

/// Tokenized real-world asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    /// Jurisdiction code selecting the land registry (e.g. "UK", "SG")
    pub jurisdiction: String,
    /// Legal entity the registry should report as owner
    pub spv_legal_entity_id: String,
    /// Contract through which the SPV controls the asset
    pub spv_contract_address: String,
    /// Title / parcel reference in the registry
    pub registry_reference: String,
    #[serde(default)]
    pub reserve_oracle_address: Option<String>,
    /// Token whose supply must be backed by reserves
    #[serde(default)]
    pub token_contract_address: Option<String>,
    /// Issued token units at registration
    #[serde(default)]
    pub total_token_supply: Option<Decimal>,
}

impl Asset {
    /// Token contract, falling back to the SPV contract
    pub fn token_address(&self) -> &str {
        self.token_contract_address
            .as_deref()
            .unwrap_or(&self.spv_contract_address)
    }
}

/// Read access to asset metadata
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Look up an asset; `Ok(None)` when it is not registered
    async fn find_asset(&self, asset_id: &str) -> CoreResult<Option<Asset>>;
}

/// Asset repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryAssetRepository {
    assets: RwLock<HashMap<String, Asset>>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let repo = Self::new();
        for asset in assets {
            repo.insert(asset);
        }
        repo
    }

    /// Insert or replace by `asset_id`
    pub fn insert(&self, asset: Asset) {
        let mut assets = self.assets.write().unwrap();
        assets.insert(asset.asset_id.clone(), asset);
    }

    pub fn remove(&self, asset_id: &str) {
        self.assets.write().unwrap().remove(asset_id);
    }

    pub fn len(&self) -> usize {
        self.assets.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn find_asset(&self, asset_id: &str) -> CoreResult<Option<Asset>> {
        let assets = self.assets.read().unwrap();
        Ok(assets.get(asset_id).cloned())
    }
}

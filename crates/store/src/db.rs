//! Pool setup and schema initialization

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

use crate::assets::SqliteAssetRepository;
use crate::audit::SqliteAuditSink;
use crate::error::StoreResult;
use crate::transfers::SqliteTransferStore;

/// Bound on waiting for a pooled connection; queries never hang the guard
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// One SQLite database holding every guard table
#[derive(Clone)]
pub struct GuardDatabase {
    pool: SqlitePool,
}

impl GuardDatabase {
    /// Open (creating if needed) and initialize the schema
    pub async fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&db_url)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    /// Single-connection in-memory database (tests)
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> StoreResult<()> {
        self.assets().init().await?;
        self.transfers().init().await?;
        self.audit().init().await?;
        tracing::debug!("Guard schema initialized");
        Ok(())
    }

    /// Asset repository over the shared pool
    pub fn assets(&self) -> SqliteAssetRepository {
        SqliteAssetRepository::new(self.pool.clone())
    }

    /// Transfer store over the shared pool
    pub fn transfers(&self) -> SqliteTransferStore {
        SqliteTransferStore::new(self.pool.clone())
    }

    /// Audit sink over the shared pool
    pub fn audit(&self) -> SqliteAuditSink {
        SqliteAuditSink::new(self.pool.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

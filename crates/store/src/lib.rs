//! RWA Guard SQLite Store
//!
//! sqlx-backed implementations of the guard's storage ports, sharing one
//! pool:
//!
//! - [`SqliteAssetRepository`] - `rwa_assets`, read by the orchestrator
//! - [`SqliteTransferStore`] - `token_transfers`, read by the anomaly detector
//! - [`SqliteAuditSink`] - `compliance_decisions`, one row per verification

mod assets;
mod audit;
mod db;
mod error;
mod transfers;

pub use assets::SqliteAssetRepository;
pub use audit::SqliteAuditSink;
pub use db::GuardDatabase;
pub use error::{StoreError, StoreResult};
pub use transfers::SqliteTransferStore;

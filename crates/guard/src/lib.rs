//! RWA Guard - Oracle-verified ownership guard
//!
//! Fuses four independent evidence sources into one verdict per asset:
//!
//! ```text
//!                        ┌── LandRegistryCheck ───┐
//!  verify_ownership ─────┼── ProofOfReserveCheck ─┼──► ScoreCard ──► OwnershipVerification
//!   (per-asset lock)     ├── SpvControlCheck ─────┤    (fixed order)        │
//!                        └── AnomalyDetector ─────┘                         ├──► AuditSink
//!                                                                           └──► AlertPublisher
//! ```
//!
//! [`OwnershipVerificationOrchestrator::start_continuous_polling`] repeats
//! the verification on a fixed interval through the [`PollingScheduler`].
//!
//! # Example
//!
//! ```ignore
//! let guard = OwnershipVerificationOrchestrator::builder(assets)
//!     .with_config(GuardConfig::from_file("guard.json")?)
//!     .with_live_sources()?
//!     .with_transfers(transfers)
//!     .with_audit_sink(ledger)
//!     .build()?;
//!
//! let verdict = guard.verify_ownership("RWA-001", "").await;
//! ```

mod config;
mod error;
mod orchestrator;
mod scheduler;

pub use config::{
    GuardConfig, ENV_POLLING_INTERVAL_SECS, ENV_REGISTRIES, ENV_RESERVE_ORACLES, ENV_RPC_URL,
};
pub use error::{GuardError, GuardResult};
pub use orchestrator::{OrchestratorBuilder, OwnershipVerificationOrchestrator};
pub use scheduler::PollingScheduler;

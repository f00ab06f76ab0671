//! RWA Guard Anomaly Detection
//!
//! Statistical check over the asset's transfer history:
//!
//! ```text
//!  TransferStore ──► WindowAggregate   (last 24h)  ─┐
//!               └──► HistoricalBaseline (30 days) ─┴─► AnomalyDetector ──► CheckOutcome
//! ```
//!
//! Four conditions are evaluated independently and each raises its own
//! flag, but the check contributes a single flat penalty.

mod detector;
mod error;
mod store;
mod thresholds;

pub use detector::{evaluate_activity, AnomalyDetector};
pub use error::{AnomalyError, AnomalyResult};
pub use store::{HistoricalBaseline, InMemoryTransferStore, TransferRecord, TransferStore, WindowAggregate};
pub use thresholds::{baseline_start, AnomalyThresholds, MAX_BASELINE_DAYS, MAX_WINDOW_HOURS};

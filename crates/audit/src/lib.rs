//! RWA Guard Audit Trail
//!
//! Every completed verification becomes exactly one [`AuditEntry`]. Entries
//! are never updated or deleted.
//!
//! - [`MemoryAuditSink`] - In-process sink for tests and embedding
//! - [`FanoutAuditSink`] - Writes each entry to several sinks
//! - [`JsonlAuditLedger`] - Append-only JSONL file; each line carries a
//!   sequence number and SHA-256 link to its predecessor so gaps and edits
//!   are detectable with [`JsonlAuditLedger::verify_chain`]

mod entry;
mod error;
pub mod hash;
mod ledger;
mod sink;

pub use entry::{AuditEntry, AuditReasoning, DECISION_TYPE};
pub use error::{AuditError, AuditResult};
pub use ledger::{JsonlAuditLedger, LedgerRecord};
pub use sink::{AuditSink, FanoutAuditSink, MemoryAuditSink};

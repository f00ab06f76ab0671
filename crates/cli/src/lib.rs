//! RWA Guard CLI
//!
//! Wires the SQLite store, the JSONL audit ledger and the live evidence
//! sources into an orchestrator for the `rwaguard` binary.

pub mod commands;
pub mod context;

pub use context::AppContext;

//! Append-only JSONL audit ledger
//!
//! One sealed record per line. The file is only ever appended to; reopening
//! an existing ledger resumes the chain from its last record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::entry::AuditEntry;
use crate::error::AuditResult;
use crate::hash::{self, GENESIS};
use crate::sink::AuditSink;

/// An audit entry with its position in the hash chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub entry: AuditEntry,
}

impl LedgerRecord {
    /// Compute the hash and build the record
    pub fn seal(sequence: u64, prev_hash: &str, entry: AuditEntry) -> Self {
        let hash = hash::calculate_record_hash(sequence, prev_hash, &entry);
        Self {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash,
            entry,
        }
    }
}

struct ChainTail {
    file: File,
    sequence: u64,
    last_hash: String,
}

pub struct JsonlAuditLedger {
    path: PathBuf,
    tail: Mutex<ChainTail>,
}

impl JsonlAuditLedger {
    /// Open (or create) a ledger at the given path
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let existing = if path.exists() {
            read_records(&path)?
        } else {
            Vec::new()
        };
        let (sequence, last_hash) = existing
            .last()
            .map(|r| (r.sequence, r.hash.clone()))
            .unwrap_or_else(|| (0, GENESIS.to_string()));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            tail: Mutex::new(ChainTail {
                file,
                sequence,
                last_hash,
            }),
        })
    }

    /// Seal and append an entry
    pub fn append(&self, entry: AuditEntry) -> AuditResult<LedgerRecord> {
        let mut tail = self.tail.lock().unwrap();

        let record = LedgerRecord::seal(tail.sequence + 1, &tail.last_hash, entry);
        let json = serde_json::to_string(&record)?;
        writeln!(tail.file, "{}", json)?;
        tail.file.flush()?;

        tail.sequence = record.sequence;
        tail.last_hash = record.hash.clone();
        Ok(record)
    }

    /// Every record in file order, without checking the chain
    pub fn read_all(&self) -> AuditResult<Vec<LedgerRecord>> {
        read_records(&self.path)
    }

    /// Entries for one asset, in write order
    pub fn entries_for(&self, asset_id: &str) -> AuditResult<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.entry.asset_id == asset_id)
            .map(|r| r.entry)
            .collect())
    }

    /// Verify the whole file; returns the number of records checked
    pub fn verify_chain(&self) -> AuditResult<usize> {
        let records = self.read_all()?;
        hash::verify_chain(&records)?;
        Ok(records.len())
    }

    /// Sequence number of the last record (0 when empty)
    pub fn last_sequence(&self) -> u64 {
        self.tail.lock().unwrap().sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_records(path: &Path) -> AuditResult<Vec<LedgerRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }

    Ok(records)
}

#[async_trait]
impl AuditSink for JsonlAuditLedger {
    async fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        let record = self.append(entry.clone())?;
        tracing::debug!(
            asset_id = %record.entry.asset_id,
            sequence = record.sequence,
            "Audit entry appended"
        );
        Ok(())
    }
}

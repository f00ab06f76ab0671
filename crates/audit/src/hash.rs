//! Hash chain utilities for audit integrity

use sha2::{Digest, Sha256};

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::ledger::LedgerRecord;

/// `prev_hash` of the first record
pub const GENESIS: &str = "GENESIS";

/// SHA-256 over the record position and every entry field
pub fn calculate_record_hash(sequence: u64, prev_hash: &str, entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();

    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(entry.id.as_bytes());
    hasher.update(entry.asset_id.as_bytes());
    hasher.update(entry.decision_type.as_bytes());
    hasher.update(entry.decision.to_string().as_bytes());
    // Display is normalized, so 0.10 and 0.1 hash alike
    hasher.update(entry.risk_score.to_string().as_bytes());

    for flag in &entry.reasoning.flags {
        hasher.update((flag.len() as u64).to_le_bytes());
        hasher.update(flag.as_bytes());
    }

    let details = &entry.reasoning.verification_details;
    hasher.update([
        details.land_registry_check as u8,
        details.proof_of_reserve_check as u8,
        details.spv_control_check as u8,
        details.anomaly_check as u8,
    ]);
    hasher.update(entry.reasoning.recommended_action.to_string().as_bytes());
    hasher.update(entry.created_at.to_rfc3339().as_bytes());

    hex::encode(hasher.finalize())
}

/// Verify links, hashes and sequence numbers of a record run
pub fn verify_chain(records: &[LedgerRecord]) -> AuditResult<()> {
    let mut prev_hash = GENESIS.to_string();

    for (i, record) in records.iter().enumerate() {
        if record.prev_hash != prev_hash {
            return Err(AuditError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = calculate_record_hash(record.sequence, &record.prev_hash, &record.entry);
        if record.hash != calculated {
            return Err(AuditError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        let expected = i as u64 + 1;
        if record.sequence != expected {
            return Err(AuditError::InvalidSequence {
                expected,
                actual: record.sequence,
            });
        }

        prev_hash = record.hash.clone();
    }

    Ok(())
}

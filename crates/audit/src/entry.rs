//! Audit entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rwaguard_core::{
    OracleScore, OwnershipStatus, OwnershipVerification, RecommendedAction, VerificationDetails,
};

/// Decision type recorded for every ownership run
pub const DECISION_TYPE: &str = "ownership_verification";

/// Why the decision was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReasoning {
    pub flags: Vec<String>,
    pub verification_details: VerificationDetails,
    pub recommended_action: RecommendedAction,
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub asset_id: String,
    pub decision_type: String,
    pub decision: OwnershipStatus,
    pub risk_score: OracleScore,
    pub reasoning: AuditReasoning,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Record a finished verification; `created_at` is the verification time
    pub fn from_verification(verification: &OwnershipVerification) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id: verification.asset_id.clone(),
            decision_type: DECISION_TYPE.to_string(),
            decision: verification.ownership_status,
            risk_score: verification.oracle_score,
            reasoning: AuditReasoning {
                flags: verification.risk_flags.clone(),
                verification_details: verification.verification_details,
                recommended_action: verification.recommended_action,
            },
            created_at: verification.last_verified,
        }
    }
}

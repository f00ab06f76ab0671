//! Ownership alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rwaguard_core::{OracleScore, OwnershipVerification, RecommendedAction};

/// Raised when a verification recommends an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipAlert {
    pub asset_id: String,
    pub action: RecommendedAction,
    pub risk_score: OracleScore,
    pub flags: Vec<String>,
    pub raised_at: DateTime<Utc>,
}

impl OwnershipAlert {
    /// Alert for a verification, or `None` when no action is recommended
    pub fn from_verification(verification: &OwnershipVerification) -> Option<Self> {
        if !verification.recommended_action.is_actionable() {
            return None;
        }

        Some(Self {
            asset_id: verification.asset_id.clone(),
            action: verification.recommended_action,
            risk_score: verification.oracle_score,
            flags: verification.risk_flags.clone(),
            raised_at: Utc::now(),
        })
    }

    /// Burning tokens cannot be undone
    pub fn is_irreversible(&self) -> bool {
        self.action == RecommendedAction::BurnTokens
    }
}

//! Ownership verification result
//!
//! An [`OwnershipVerification`] is created fresh for every run and never
//! mutated afterwards. Status and action are always derived from the score;
//! the constructors here are the only way to build one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::action::{action_for_score, status_for_score};
use crate::check::CheckKind;
use crate::score::{OracleScore, ScoreCard};

/// Categorical ownership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OwnershipStatus {
    Valid,
    Disputed,
    Transferred,
    NotFound,
}

/// Action recommended to downstream enforcement
///
/// One-way ladder: the guard never recommends lifting a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendedAction {
    None,
    PauseTrading,
    BurnTokens,
    Escalate,
}

impl RecommendedAction {
    /// Whether this action should raise an alert
    pub fn is_actionable(&self) -> bool {
        !matches!(self, RecommendedAction::None)
    }
}

/// Which sub-checks executed without error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub land_registry_check: bool,
    pub proof_of_reserve_check: bool,
    pub spv_control_check: bool,
    pub anomaly_check: bool,
}

impl VerificationDetails {
    /// Record whether `kind` executed
    pub fn set(&mut self, kind: CheckKind, executed: bool) {
        match kind {
            CheckKind::LandRegistry => self.land_registry_check = executed,
            CheckKind::ProofOfReserve => self.proof_of_reserve_check = executed,
            CheckKind::SpvControl => self.spv_control_check = executed,
            CheckKind::Anomaly => self.anomaly_check = executed,
        }
    }

    /// Whether `kind` executed
    pub fn get(&self, kind: CheckKind) -> bool {
        match kind {
            CheckKind::LandRegistry => self.land_registry_check,
            CheckKind::ProofOfReserve => self.proof_of_reserve_check,
            CheckKind::SpvControl => self.spv_control_check,
            CheckKind::Anomaly => self.anomaly_check,
        }
    }

    pub fn all_executed(&self) -> bool {
        CheckKind::ORDER.iter().all(|kind| self.get(*kind))
    }
}

/// Result of one ownership verification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipVerification {
    pub asset_id: String,
    pub is_owned: bool,
    pub ownership_status: OwnershipStatus,
    pub last_verified: DateTime<Utc>,
    pub risk_flags: Vec<String>,
    pub oracle_score: OracleScore,
    pub recommended_action: RecommendedAction,
    pub verification_details: VerificationDetails,
}

impl OwnershipVerification {
    /// Build a result from a completed score card
    pub fn from_card(asset_id: impl Into<String>, card: ScoreCard, at: DateTime<Utc>) -> Self {
        let (score, flags, details) = card.finish();
        let status = status_for_score(score);

        Self {
            asset_id: asset_id.into(),
            is_owned: status == OwnershipStatus::Valid,
            ownership_status: status,
            last_verified: at,
            risk_flags: flags,
            oracle_score: score,
            recommended_action: action_for_score(score),
            verification_details: details,
        }
    }

    /// Asset missing from the registry: escalate without running checks
    pub fn not_found(asset_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            asset_id: asset_id.into(),
            is_owned: false,
            ownership_status: OwnershipStatus::NotFound,
            last_verified: at,
            risk_flags: vec!["ASSET_NOT_FOUND".to_string()],
            oracle_score: OracleScore::ZERO,
            recommended_action: RecommendedAction::Escalate,
            verification_details: VerificationDetails::default(),
        }
    }

    /// Pipeline failed unexpectedly: neither trust nor act irreversibly
    pub fn fail_safe(asset_id: impl Into<String>, reason: &str, at: DateTime<Utc>) -> Self {
        Self {
            asset_id: asset_id.into(),
            is_owned: false,
            ownership_status: OwnershipStatus::Disputed,
            last_verified: at,
            risk_flags: vec![format!("VERIFICATION_ERROR: {}", reason)],
            oracle_score: OracleScore::UNCERTAIN,
            recommended_action: RecommendedAction::Escalate,
            verification_details: VerificationDetails::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckOutcome;
    use crate::score::REGISTRY_MISMATCH_PENALTY;
    use rust_decimal_macros::dec;

    #[test]
    fn test_clean_card_is_valid() {
        let mut card = ScoreCard::new();
        for kind in CheckKind::ORDER {
            card.apply(CheckOutcome::passed(kind));
        }
        let result = OwnershipVerification::from_card("RWA-1", card, Utc::now());

        assert!(result.is_owned);
        assert_eq!(result.ownership_status, OwnershipStatus::Valid);
        assert_eq!(result.oracle_score, OracleScore::FULL);
        assert_eq!(result.recommended_action, RecommendedAction::None);
        assert!(result.verification_details.all_executed());
    }

    #[test]
    fn test_mismatch_only_is_disputed() {
        let mut card = ScoreCard::new();
        card.apply(CheckOutcome::failed(
            CheckKind::LandRegistry,
            REGISTRY_MISMATCH_PENALTY,
            "mismatch",
        ));
        let result = OwnershipVerification::from_card("RWA-1", card, Utc::now());

        assert_eq!(result.oracle_score.value(), dec!(0.5));
        assert_eq!(result.ownership_status, OwnershipStatus::Disputed);
        assert_eq!(result.recommended_action, RecommendedAction::PauseTrading);
        assert!(!result.is_owned);
    }

    #[test]
    fn test_not_found() {
        let result = OwnershipVerification::not_found("RWA-404", Utc::now());
        assert_eq!(result.ownership_status, OwnershipStatus::NotFound);
        assert_eq!(result.oracle_score, OracleScore::ZERO);
        assert_eq!(result.recommended_action, RecommendedAction::Escalate);
        assert!(!result.verification_details.land_registry_check);
    }

    #[test]
    fn test_fail_safe_never_burns() {
        let result = OwnershipVerification::fail_safe("RWA-1", "boom", Utc::now());
        assert_eq!(result.ownership_status, OwnershipStatus::Disputed);
        assert_eq!(result.oracle_score.value(), dec!(0.5));
        assert_eq!(result.recommended_action, RecommendedAction::Escalate);
        assert_eq!(result.risk_flags, vec!["VERIFICATION_ERROR: boom".to_string()]);
    }

    #[test]
    fn test_serialization_uses_snake_case() {
        let result = OwnershipVerification::not_found("RWA-404", Utc::now());
        let json = serde_json::to_string(&result).unwrap();

        assert!(json.contains("\"ownership_status\":\"not_found\""));
        assert!(json.contains("\"recommended_action\":\"escalate\""));
        assert!(json.contains("\"oracle_score\":0"));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(RecommendedAction::PauseTrading.to_string(), "pause_trading");
        assert_eq!(OwnershipStatus::NotFound.to_string(), "not_found");
        assert!(!RecommendedAction::None.is_actionable());
        assert!(RecommendedAction::BurnTokens.is_actionable());
    }
}

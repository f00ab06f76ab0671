//! Sub-check outcomes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::policy::{TrustAction, TrustPolicy};
use crate::score::{
    ANOMALY_PENALTY, CONTROL_LOST_PENALTY, REGISTRY_MISMATCH_PENALTY, RESERVE_SHORTFALL_PENALTY,
};

/// The four independent evidence sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    LandRegistry,
    ProofOfReserve,
    SpvControl,
    Anomaly,
}

impl CheckKind {
    /// Fixed fold order; flags follow this order regardless of completion order
    pub const ORDER: [CheckKind; 4] = [
        CheckKind::LandRegistry,
        CheckKind::ProofOfReserve,
        CheckKind::SpvControl,
        CheckKind::Anomaly,
    ];

    /// Prefix used for this check's flags
    pub fn flag_prefix(&self) -> &'static str {
        match self {
            CheckKind::LandRegistry => "LAND_REGISTRY",
            CheckKind::ProofOfReserve => "PROOF_OF_RESERVE",
            CheckKind::SpvControl => "SPV_CONTROL",
            CheckKind::Anomaly => "ANOMALY_CHECK",
        }
    }

    /// Penalty of the check's most severe finding, used by `TrustAction::Fail`
    pub fn failure_penalty(&self) -> Decimal {
        match self {
            CheckKind::LandRegistry => REGISTRY_MISMATCH_PENALTY,
            CheckKind::ProofOfReserve => RESERVE_SHORTFALL_PENALTY,
            CheckKind::SpvControl => CONTROL_LOST_PENALTY,
            CheckKind::Anomaly => ANOMALY_PENALTY,
        }
    }
}

/// What one sub-check contributes to the score card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    /// The check ran without error (not: the check passed)
    pub executed: bool,
    /// Amount subtracted from the score (never negative)
    pub penalty: Decimal,
    pub flags: Vec<String>,
}

impl CheckOutcome {
    /// Check ran and found nothing
    pub fn passed(kind: CheckKind) -> Self {
        Self {
            kind,
            executed: true,
            penalty: Decimal::ZERO,
            flags: Vec::new(),
        }
    }

    /// Check ran and raised a single flag with a penalty
    pub fn failed(kind: CheckKind, penalty: Decimal, flag: impl Into<String>) -> Self {
        Self {
            kind,
            executed: true,
            penalty,
            flags: vec![flag.into()],
        }
    }

    /// Check could not run; the penalty comes from the trust policy
    pub fn unavailable(kind: CheckKind, penalty: Decimal, flag: impl Into<String>) -> Self {
        Self {
            kind,
            executed: false,
            penalty,
            flags: vec![flag.into()],
        }
    }

    /// Evidence source not configured for this asset
    pub fn not_configured(kind: CheckKind, policy: &TrustPolicy, what: &str) -> Self {
        match policy.on_missing_config {
            TrustAction::Skip => Self::passed(kind),
            action => Self::failed(
                kind,
                action.penalty(kind.failure_penalty()),
                format!("{}_NOT_CONFIGURED: {}", kind.flag_prefix(), what),
            ),
        }
    }

    /// Evidence source configured but the read failed
    pub fn read_failed(kind: CheckKind, policy: &TrustPolicy, error: &dyn std::fmt::Display) -> Self {
        Self::unavailable(
            kind,
            policy.on_read_failure.penalty(kind.failure_penalty()),
            format!("{}_UNAVAILABLE: {}", kind.flag_prefix(), error),
        )
    }

    /// Append a flag without changing the penalty
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// No penalty and no flags
    pub fn is_clean(&self) -> bool {
        self.penalty.is_zero() && self.flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_passed_is_clean() {
        let outcome = CheckOutcome::passed(CheckKind::Anomaly);
        assert!(outcome.executed);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_unavailable_marks_not_executed() {
        let outcome = CheckOutcome::unavailable(CheckKind::LandRegistry, dec!(0.1), "down");
        assert!(!outcome.executed);
        assert_eq!(outcome.penalty, dec!(0.1));
        assert_eq!(outcome.flags, vec!["down".to_string()]);
    }

    #[test]
    fn test_not_configured_follows_policy() {
        let trusting = TrustPolicy::trusting();
        assert!(CheckOutcome::not_configured(CheckKind::ProofOfReserve, &trusting, "no oracle").is_clean());

        let strict = TrustPolicy::new(TrustAction::Fail, TrustAction::Fail);
        let outcome = CheckOutcome::not_configured(CheckKind::ProofOfReserve, &strict, "no oracle");
        assert!(outcome.executed);
        assert_eq!(outcome.penalty, dec!(0.3));
        assert_eq!(outcome.flags, vec!["PROOF_OF_RESERVE_NOT_CONFIGURED: no oracle".to_string()]);
    }

    #[test]
    fn test_read_failed_always_flags() {
        let outcome = CheckOutcome::read_failed(CheckKind::SpvControl, &TrustPolicy::trusting(), &"rpc down");
        assert!(!outcome.executed);
        assert!(outcome.penalty.is_zero());
        assert_eq!(outcome.flags, vec!["SPV_CONTROL_UNAVAILABLE: rpc down".to_string()]);

        let penalize = TrustPolicy::new(TrustAction::Skip, TrustAction::Penalize);
        let outcome = CheckOutcome::read_failed(CheckKind::LandRegistry, &penalize, &"timeout");
        assert_eq!(outcome.penalty, dec!(0.1));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CheckKind::ProofOfReserve.to_string(), "proof_of_reserve");
        assert_eq!("spv_control".parse::<CheckKind>().unwrap(), CheckKind::SpvControl);
    }
}

//! Trust policy for unconfigured or unreachable evidence sources
//!
//! Several checks pass silently when they are not configured or when a read
//! fails. That choice changes fraud-detection sensitivity, so it is a named
//! policy here instead of being buried in each checker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::score::UNAVAILABLE_PENALTY;

/// What to do with a check that could not produce evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrustAction {
    /// Treat as passing (trust by default)
    Skip,
    /// Subtract the small fixed unavailable penalty
    Penalize,
    /// Subtract the check's full failure penalty
    Fail,
}

impl TrustAction {
    /// Penalty to apply, given the check's own failure penalty
    pub fn penalty(&self, failure_penalty: Decimal) -> Decimal {
        match self {
            TrustAction::Skip => Decimal::ZERO,
            TrustAction::Penalize => UNAVAILABLE_PENALTY,
            TrustAction::Fail => failure_penalty,
        }
    }
}

/// Policy for a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    pub on_missing_config: TrustAction,
    pub on_read_failure: TrustAction,
}

impl TrustPolicy {
    pub const fn new(on_missing_config: TrustAction, on_read_failure: TrustAction) -> Self {
        Self {
            on_missing_config,
            on_read_failure,
        }
    }

    /// Trust on both counts
    pub const fn trusting() -> Self {
        Self::new(TrustAction::Skip, TrustAction::Skip)
    }
}

/// Policies for all four checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicies {
    #[serde(default = "default_registry_policy")]
    pub land_registry: TrustPolicy,
    #[serde(default = "TrustPolicy::trusting")]
    pub proof_of_reserve: TrustPolicy,
    #[serde(default = "TrustPolicy::trusting")]
    pub spv_control: TrustPolicy,
    #[serde(default = "TrustPolicy::trusting")]
    pub anomaly: TrustPolicy,
}

fn default_registry_policy() -> TrustPolicy {
    TrustPolicy::new(TrustAction::Skip, TrustAction::Penalize)
}

impl Default for TrustPolicies {
    fn default() -> Self {
        Self {
            land_registry: default_registry_policy(),
            proof_of_reserve: TrustPolicy::trusting(),
            spv_control: TrustPolicy::trusting(),
            anomaly: TrustPolicy::trusting(),
        }
    }
}

impl TrustPolicies {
    /// Penalize or fail on everything (strictest sensible setting)
    pub fn strict() -> Self {
        let strict = TrustPolicy::new(TrustAction::Penalize, TrustAction::Fail);
        Self {
            land_registry: strict,
            proof_of_reserve: strict,
            spv_control: strict,
            anomaly: strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_trust_by_default() {
        let policies = TrustPolicies::default();
        assert_eq!(policies.land_registry.on_missing_config, TrustAction::Skip);
        assert_eq!(policies.land_registry.on_read_failure, TrustAction::Penalize);
        assert_eq!(policies.proof_of_reserve, TrustPolicy::trusting());
        assert_eq!(policies.spv_control, TrustPolicy::trusting());
        assert_eq!(policies.anomaly, TrustPolicy::trusting());
    }

    #[test]
    fn test_action_penalties() {
        assert_eq!(TrustAction::Skip.penalty(dec!(0.4)), Decimal::ZERO);
        assert_eq!(TrustAction::Penalize.penalty(dec!(0.4)), dec!(0.1));
        assert_eq!(TrustAction::Fail.penalty(dec!(0.4)), dec!(0.4));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "spv_control": { "on_missing_config": "skip", "on_read_failure": "fail" } }"#;
        let policies: TrustPolicies = serde_json::from_str(json).unwrap();

        assert_eq!(policies.spv_control.on_read_failure, TrustAction::Fail);
        assert_eq!(policies.land_registry.on_read_failure, TrustAction::Penalize);
    }
}

//! Oracle score and score card
//!
//! Every verification starts at full confidence (`1.0`) and each sub-check
//! subtracts a fixed penalty. The sum is clamped into `[0, 1]`.
//!
//! Scores use `Decimal` so that `1.0 - 0.5 - 0.4` is exactly `0.1` and the
//! threshold mapping never flips on a rounding error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::check::CheckOutcome;
use crate::verification::VerificationDetails;

/// Land registry reports a different owner than the SPV
pub const REGISTRY_MISMATCH_PENALTY: Decimal = dec!(0.5);
/// Land registry record modified inside the recent-change window
pub const REGISTRY_RECENT_CHANGE_PENALTY: Decimal = dec!(0.2);
/// Attested reserves below issued supply
pub const RESERVE_SHORTFALL_PENALTY: Decimal = dec!(0.3);
/// SPV no longer controls the asset contract
pub const CONTROL_LOST_PENALTY: Decimal = dec!(0.4);
/// SPV control changed hands inside the recent-change window
pub const CONTROL_RECENT_TRANSFER_PENALTY: Decimal = dec!(0.15);
/// Flat penalty for any number of anomaly conditions
pub const ANOMALY_PENALTY: Decimal = dec!(0.2);
/// Evidence source configured but unreachable
pub const UNAVAILABLE_PENALTY: Decimal = dec!(0.1);

/// Confidence in valid, exclusive ownership. Always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OracleScore(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl OracleScore {
    pub const ZERO: OracleScore = OracleScore(Decimal::ZERO);
    pub const FULL: OracleScore = OracleScore(Decimal::ONE);
    /// Cautious middle value used when the pipeline itself fails
    pub const UNCERTAIN: OracleScore = OracleScore(dec!(0.5));

    /// Create a score, clamping into `[0, 1]`
    pub fn clamped(value: Decimal) -> Self {
        OracleScore(value.clamp(Decimal::ZERO, Decimal::ONE))
    }

    /// Underlying decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for OracleScore {
    fn default() -> Self {
        OracleScore::FULL
    }
}

impl std::fmt::Display for OracleScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Accumulates sub-check outcomes into a score, flags and details
///
/// Outcomes must be applied in a fixed order so that flags are ordered
/// deterministically; the score itself is order-independent.
#[derive(Debug, Clone)]
pub struct ScoreCard {
    raw: Decimal,
    flags: Vec<String>,
    details: VerificationDetails,
}

impl Default for ScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard {
    /// Start at full confidence with no flags
    pub fn new() -> Self {
        Self {
            raw: Decimal::ONE,
            flags: Vec::new(),
            details: VerificationDetails::default(),
        }
    }

    /// Fold one sub-check outcome into the card
    pub fn apply(&mut self, outcome: CheckOutcome) {
        self.raw -= outcome.penalty;
        self.flags.extend(outcome.flags);
        self.details.set(outcome.kind, outcome.executed);
    }

    /// Unclamped running total (may be negative)
    pub fn raw(&self) -> Decimal {
        self.raw
    }

    /// Clamped score
    pub fn score(&self) -> OracleScore {
        OracleScore::clamped(self.raw)
    }

    /// Flags in the order outcomes were applied
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Which checks executed so far
    pub fn details(&self) -> VerificationDetails {
        self.details
    }

    /// Consume the card into its parts
    pub fn finish(self) -> (OracleScore, Vec<String>, VerificationDetails) {
        (OracleScore::clamped(self.raw), self.flags, self.details)
    }
}

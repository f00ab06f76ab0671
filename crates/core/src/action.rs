//! Score → status / action mapping
//!
//! Both functions are pure: the same score always yields the same result.
//! The not-found and fail-safe cases bypass this mapping.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::score::OracleScore;
use crate::verification::{OwnershipStatus, RecommendedAction};

/// At or above: ownership is valid, no action
pub const VALID_THRESHOLD: Decimal = dec!(0.7);
/// Below: ownership considered transferred, tokens should be burned
pub const TRANSFERRED_THRESHOLD: Decimal = dec!(0.3);

/// Map a clamped score to an ownership status
pub fn status_for_score(score: OracleScore) -> OwnershipStatus {
    let value = score.value();
    if value >= VALID_THRESHOLD {
        OwnershipStatus::Valid
    } else if value >= TRANSFERRED_THRESHOLD {
        OwnershipStatus::Disputed
    } else {
        OwnershipStatus::Transferred
    }
}

/// Map a clamped score to the recommended action
pub fn action_for_score(score: OracleScore) -> RecommendedAction {
    let value = score.value();
    if value < TRANSFERRED_THRESHOLD {
        RecommendedAction::BurnTokens
    } else if value < VALID_THRESHOLD {
        RecommendedAction::PauseTrading
    } else {
        RecommendedAction::None
    }
}

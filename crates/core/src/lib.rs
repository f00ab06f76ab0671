//! RWA Guard Core
//!
//! Domain types shared by every crate of the ownership guard:
//!
//! ```text
//!  Registry ─┐
//!  Reserve  ─┤  CheckOutcome   ┌────────────┐   OracleScore   ┌──────────────────┐
//!  Control  ─┼───────────────► │ ScoreCard  │ ──────────────► │ status + action  │
//!  Anomaly  ─┘                 └────────────┘   (clamped)     └──────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`asset::Asset`] - Read-only asset metadata owned by the registration system
//! - [`check::CheckOutcome`] - Score deltas and flags produced by one sub-check
//! - [`score::ScoreCard`] - Folds outcomes into a clamped [`score::OracleScore`]
//! - [`action`] - Pure mapping from score to status and recommended action
//! - [`policy::TrustPolicy`] - What a sub-check does when unconfigured or unreachable
//! - [`verification::OwnershipVerification`] - Immutable result of one run

pub mod action;
pub mod asset;
pub mod check;
pub mod clock;
pub mod error;
pub mod policy;
pub mod score;
pub mod verification;

pub use action::{action_for_score, status_for_score};
pub use asset::{Asset, AssetRepository, InMemoryAssetRepository};
pub use check::{CheckKind, CheckOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use policy::{TrustAction, TrustPolicies, TrustPolicy};
pub use score::{OracleScore, ScoreCard};
pub use verification::{
    OwnershipStatus, OwnershipVerification, RecommendedAction, VerificationDetails,
};

//! Proof-of-reserve check

use std::collections::HashMap;
use std::sync::Arc;

use rwaguard_core::score::RESERVE_SHORTFALL_PENALTY;
use rwaguard_core::{Asset, CheckKind, CheckOutcome, TrustPolicy};

use crate::error::ChainError;
use crate::reader::{ReserveOracle, RoundData, SupplyReader};

const KIND: CheckKind = CheckKind::ProofOfReserve;

/// Compare attested reserves with issued supply; `-0.3` on shortfall
///
/// A negative answer is not a valid attestation and is reported as an error.
pub fn evaluate_reserves(round: &RoundData, supply: u128) -> Result<CheckOutcome, ChainError> {
    let reserves = u128::try_from(round.answer).map_err(|_| {
        ChainError::InvalidResponse(format!("negative reserve answer {}", round.answer))
    })?;

    if reserves >= supply {
        Ok(CheckOutcome::passed(KIND))
    } else {
        Ok(CheckOutcome::failed(
            KIND,
            RESERVE_SHORTFALL_PENALTY,
            format!(
                "PROOF_OF_RESERVE_SHORTFALL: reserves {} below token supply {}",
                reserves, supply
            ),
        ))
    }
}

/// Reserve feed vs token supply
pub struct ProofOfReserveCheck {
    oracle: Arc<dyn ReserveOracle>,
    supply: Arc<dyn SupplyReader>,
    /// asset_id -> feed address, used when the asset carries none
    feeds: HashMap<String, String>,
    policy: TrustPolicy,
}

impl ProofOfReserveCheck {
    pub fn new(
        oracle: Arc<dyn ReserveOracle>,
        supply: Arc<dyn SupplyReader>,
        feeds: HashMap<String, String>,
        policy: TrustPolicy,
    ) -> Self {
        Self {
            oracle,
            supply,
            feeds,
            policy,
        }
    }

    /// Feed address for an asset: its own, else the configured map
    pub fn feed_for<'a>(&'a self, asset: &'a Asset) -> Option<&'a str> {
        asset
            .reserve_oracle_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .or_else(|| self.feeds.get(&asset.asset_id).map(String::as_str))
    }

    /// Compare the latest reserve answer against the token's total supply
    pub async fn run(&self, asset: &Asset) -> CheckOutcome {
        let Some(feed) = self.feed_for(asset) else {
            tracing::debug!(asset_id = %asset.asset_id, "No reserve oracle configured");
            return CheckOutcome::not_configured(KIND, &self.policy, "no reserve oracle");
        };

        let reads = async {
            let (round, supply) = tokio::try_join!(
                self.oracle.latest_round(feed),
                self.supply.total_supply(asset.token_address()),
            )?;
            evaluate_reserves(&round, supply)
        };

        match reads.await {
            Ok(outcome) => {
                tracing::debug!(
                    asset_id = %asset.asset_id,
                    feed,
                    penalty = %outcome.penalty,
                    "Proof of reserve check completed"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    feed,
                    error = %e,
                    "Proof of reserve check unavailable"
                );
                CheckOutcome::read_failed(KIND, &self.policy, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use rust_decimal_macros::dec;
    use rwaguard_core::TrustAction;

    const FEED: &str = "0x00000000000000000000000000000000000000f1";
    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";

    fn asset(feed: Option<&str>) -> Asset {
        Asset {
            asset_id: "RWA-001".to_string(),
            jurisdiction: "UK".to_string(),
            spv_legal_entity_id: "SPV-LTD-42".to_string(),
            spv_contract_address: TOKEN.to_string(),
            registry_reference: "TITLE-123".to_string(),
            reserve_oracle_address: feed.map(str::to_string),
            token_contract_address: None,
            total_token_supply: None,
        }
    }

    fn check(chain: Arc<MockChain>, feeds: HashMap<String, String>, policy: TrustPolicy) -> ProofOfReserveCheck {
        ProofOfReserveCheck::new(chain.clone(), chain, feeds, policy)
    }

    #[test]
    fn test_evaluate_reserves() {
        assert!(evaluate_reserves(&RoundData::with_answer(100), 100).unwrap().is_clean());

        let short = evaluate_reserves(&RoundData::with_answer(99), 100).unwrap();
        assert_eq!(short.penalty, dec!(0.3));
        assert_eq!(
            short.flags,
            vec!["PROOF_OF_RESERVE_SHORTFALL: reserves 99 below token supply 100".to_string()]
        );

        assert!(evaluate_reserves(&RoundData::with_answer(-1), 0).is_err());
    }

    #[tokio::test]
    async fn test_shortfall_via_configured_map() {
        let chain = Arc::new(MockChain::new());
        chain.set_reserves(FEED, 500);
        chain.set_supply(TOKEN, 1_000);
        let feeds = HashMap::from([("RWA-001".to_string(), FEED.to_string())]);

        let outcome = check(chain, feeds, TrustPolicy::trusting()).run(&asset(None)).await;
        assert!(outcome.executed);
        assert_eq!(outcome.penalty, dec!(0.3));
    }

    #[tokio::test]
    async fn test_no_oracle_is_skipped() {
        let chain = Arc::new(MockChain::new());
        let outcome = check(chain, HashMap::new(), TrustPolicy::trusting())
            .run(&asset(None))
            .await;
        assert!(outcome.executed);
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_read_failure_trusts_by_default_but_flags() {
        let chain = Arc::new(MockChain::new());
        chain.set_supply(TOKEN, 1_000);
        chain.fail_address(FEED);

        let outcome = check(chain, HashMap::new(), TrustPolicy::trusting())
            .run(&asset(Some(FEED)))
            .await;
        assert!(!outcome.executed);
        assert!(outcome.penalty.is_zero());
        assert!(outcome.flags[0].starts_with("PROOF_OF_RESERVE_UNAVAILABLE"));
    }

    #[tokio::test]
    async fn test_read_failure_fails_under_strict_policy() {
        let chain = Arc::new(MockChain::new());
        chain.fail_address(FEED);

        let policy = TrustPolicy::new(TrustAction::Skip, TrustAction::Fail);
        let outcome = check(chain, HashMap::new(), policy).run(&asset(Some(FEED))).await;
        assert_eq!(outcome.penalty, dec!(0.3));
    }
}

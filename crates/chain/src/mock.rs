//! Mock chain for testing
//!
//! Implements every reader trait over in-memory state. Addresses listed as
//! failing return a timeout for any read.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::ChainError;
use crate::reader::{ControlStateReader, ReserveOracle, RoundData, SupplyReader};

#[derive(Debug, Clone, Copy)]
struct ControllerState {
    has_code: bool,
    has_control: bool,
    last_transfer_block: u64,
}

/// Programmable in-memory chain
#[derive(Debug, Default)]
pub struct MockChain {
    rounds: RwLock<HashMap<String, RoundData>>,
    supplies: RwLock<HashMap<String, u128>>,
    controllers: RwLock<HashMap<String, ControllerState>>,
    failing: RwLock<HashSet<String>>,
    block: RwLock<u64>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current block number
    pub fn set_block(&self, block: u64) {
        *self.block.write().unwrap() = block;
    }

    /// Set the latest round answer of a reserve feed
    pub fn set_reserves(&self, feed: &str, answer: i128) {
        let mut rounds = self.rounds.write().unwrap();
        rounds.insert(feed.to_lowercase(), RoundData::with_answer(answer));
    }

    /// Set the raw total supply of a token
    pub fn set_supply(&self, token: &str, supply: u128) {
        let mut supplies = self.supplies.write().unwrap();
        supplies.insert(token.to_lowercase(), supply);
    }

    /// Live controller that never transferred control
    pub fn set_controller(&self, contract: &str, has_control: bool) {
        self.set_controller_state(contract, true, has_control, 0);
    }

    /// Record a control change at `block`
    pub fn set_control_transfer(&self, contract: &str, has_control: bool, block: u64) {
        self.set_controller_state(contract, true, has_control, block);
    }

    /// Controller whose bytecode has been removed
    pub fn destroy_controller(&self, contract: &str) {
        self.set_controller_state(contract, false, false, 0);
    }

    fn set_controller_state(&self, contract: &str, has_code: bool, has_control: bool, last_transfer_block: u64) {
        let mut controllers = self.controllers.write().unwrap();
        controllers.insert(
            contract.to_lowercase(),
            ControllerState {
                has_code,
                has_control,
                last_transfer_block,
            },
        );
    }

    /// Every read touching this address fails
    pub fn fail_address(&self, address: &str) {
        self.failing.write().unwrap().insert(address.to_lowercase());
    }

    fn check_failing(&self, address: &str) -> Result<(), ChainError> {
        if self.failing.read().unwrap().contains(&address.to_lowercase()) {
            return Err(ChainError::Timeout(10_000));
        }
        Ok(())
    }

    fn controller(&self, contract: &str) -> Result<ControllerState, ChainError> {
        self.check_failing(contract)?;
        let controllers = self.controllers.read().unwrap();
        controllers
            .get(&contract.to_lowercase())
            .copied()
            .ok_or_else(|| ChainError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            })
    }
}

#[async_trait]
impl ReserveOracle for MockChain {
    async fn latest_round(&self, feed: &str) -> Result<RoundData, ChainError> {
        self.check_failing(feed)?;
        let rounds = self.rounds.read().unwrap();
        rounds
            .get(&feed.to_lowercase())
            .copied()
            .ok_or_else(|| ChainError::InvalidResponse(format!("no feed at {}", feed)))
    }
}

#[async_trait]
impl SupplyReader for MockChain {
    async fn total_supply(&self, token: &str) -> Result<u128, ChainError> {
        self.check_failing(token)?;
        let supplies = self.supplies.read().unwrap();
        supplies
            .get(&token.to_lowercase())
            .copied()
            .ok_or_else(|| ChainError::InvalidResponse(format!("no token at {}", token)))
    }
}

#[async_trait]
impl ControlStateReader for MockChain {
    async fn has_code(&self, contract: &str) -> Result<bool, ChainError> {
        self.check_failing(contract)?;
        let controllers = self.controllers.read().unwrap();
        Ok(controllers
            .get(&contract.to_lowercase())
            .map(|c| c.has_code)
            .unwrap_or(false))
    }

    async fn has_control(&self, contract: &str) -> Result<bool, ChainError> {
        Ok(self.controller(contract)?.has_control)
    }

    async fn last_control_transfer(&self, contract: &str) -> Result<u64, ChainError> {
        Ok(self.controller(contract)?.last_transfer_block)
    }

    async fn current_block(&self) -> Result<u64, ChainError> {
        Ok(*self.block.read().unwrap())
    }
}

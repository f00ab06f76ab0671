//! Reader traits and the JSON-RPC implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::abi;
use crate::error::ChainError;
use crate::rpc::JsonRpcClient;

/// One round of a reserve attestation feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u128,
    /// Attested reserve quantity
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u128,
}

impl RoundData {
    /// Round with only the answer set (mocks, tests)
    pub fn with_answer(answer: i128) -> Self {
        Self {
            round_id: 1,
            answer,
            started_at: 0,
            updated_at: 0,
            answered_in_round: 1,
        }
    }
}

/// Reserve attestation feed
#[async_trait]
pub trait ReserveOracle: Send + Sync {
    async fn latest_round(&self, feed: &str) -> Result<RoundData, ChainError>;
}

/// Token supply reader
#[async_trait]
pub trait SupplyReader: Send + Sync {
    async fn total_supply(&self, token: &str) -> Result<u128, ChainError>;
}

/// SPV controlling-contract state reader
#[async_trait]
pub trait ControlStateReader: Send + Sync {
    /// Whether any bytecode is deployed at the address
    async fn has_code(&self, contract: &str) -> Result<bool, ChainError>;

    async fn has_control(&self, contract: &str) -> Result<bool, ChainError>;

    /// Block number of the last control transfer (0 = never)
    async fn last_control_transfer(&self, contract: &str) -> Result<u64, ChainError>;

    async fn current_block(&self) -> Result<u64, ChainError>;
}

/// All chain readers over one JSON-RPC endpoint
pub struct EvmChainReader {
    rpc: JsonRpcClient,
}

impl EvmChainReader {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &JsonRpcClient {
        &self.rpc
    }
}

#[async_trait]
impl ReserveOracle for EvmChainReader {
    async fn latest_round(&self, feed: &str) -> Result<RoundData, ChainError> {
        let data = self.rpc.eth_call(feed, abi::LATEST_ROUND_DATA).await?;
        Ok(RoundData {
            round_id: abi::decode_u128(&data, 0)?,
            answer: abi::decode_i128(&data, 1)?,
            started_at: abi::decode_u64(&data, 2)?,
            updated_at: abi::decode_u64(&data, 3)?,
            answered_in_round: abi::decode_u128(&data, 4)?,
        })
    }
}

#[async_trait]
impl SupplyReader for EvmChainReader {
    async fn total_supply(&self, token: &str) -> Result<u128, ChainError> {
        let data = self.rpc.eth_call(token, abi::TOTAL_SUPPLY).await?;
        abi::decode_u128(&data, 0)
    }
}

#[async_trait]
impl ControlStateReader for EvmChainReader {
    async fn has_code(&self, contract: &str) -> Result<bool, ChainError> {
        Ok(!self.rpc.get_code(contract).await?.is_empty())
    }

    async fn has_control(&self, contract: &str) -> Result<bool, ChainError> {
        let data = self.rpc.eth_call(contract, abi::HAS_CONTROL).await?;
        abi::decode_bool(&data, 0)
    }

    async fn last_control_transfer(&self, contract: &str) -> Result<u64, ChainError> {
        let data = self.rpc.eth_call(contract, abi::LAST_CONTROL_TRANSFER).await?;
        abi::decode_u64(&data, 0)
    }

    async fn current_block(&self) -> Result<u64, ChainError> {
        self.rpc.block_number().await
    }
}

//! RWA Guard On-chain Evidence
//!
//! Read-only chain access for the two on-chain checks:
//!
//! ```text
//!  ProofOfReserveCheck ──► ReserveOracle::latest_round   (latestRoundData)
//!                     └──► SupplyReader::total_supply    (totalSupply)
//!
//!  SpvControlCheck ──────► ControlStateReader            (eth_getCode, hasControl,
//!                                                         lastControlTransfer, eth_blockNumber)
//! ```
//!
//! [`EvmChainReader`] implements all three readers over plain JSON-RPC;
//! [`MockChain`] provides programmable state for tests.

pub mod abi;
mod control;
mod error;
mod mock;
mod reader;
mod reserve;
mod rpc;

pub use control::{evaluate_control, ControlState, SpvControlCheck};
pub use error::ChainError;
pub use mock::MockChain;
pub use reader::{ControlStateReader, EvmChainReader, ReserveOracle, RoundData, SupplyReader};
pub use reserve::{evaluate_reserves, ProofOfReserveCheck};
pub use rpc::JsonRpcClient;

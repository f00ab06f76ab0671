//! Chain read errors

use thiserror::Error;

/// Errors from on-chain reads
#[derive(Debug, Error)]
pub enum ChainError {
    /// Node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("RPC transport failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Chain read timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Value does not fit the target integer type
    #[error("Value overflow decoding {0}")]
    Overflow(&'static str),
}

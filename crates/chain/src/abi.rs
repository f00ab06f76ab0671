//! Minimal ABI helpers for argument-less view calls
//!
//! Only static return types are decoded: `bool`, `uint256` and `int256`
//! words, narrowed to 128-bit integers.

use sha3::{Digest, Keccak256};

use crate::error::ChainError;

pub const WORD: usize = 32;

/// `totalSupply()` on ERC-20 tokens
pub const TOTAL_SUPPLY: &str = "totalSupply()";
/// `latestRoundData()` on reserve feeds
pub const LATEST_ROUND_DATA: &str = "latestRoundData()";
/// `hasControl()` on the SPV controller
pub const HAS_CONTROL: &str = "hasControl()";
/// `lastControlTransfer()` on the SPV controller
pub const LAST_CONTROL_TRANSFER: &str = "lastControlTransfer()";

/// First four bytes of the Keccak-256 hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a call without arguments
pub fn calldata(signature: &str) -> String {
    format!("0x{}", hex::encode(selector(signature)))
}

/// Decode a `0x`-prefixed hex string
pub fn decode_hex(raw: &str) -> Result<Vec<u8>, ChainError> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(trimmed).map_err(|e| ChainError::InvalidResponse(format!("bad hex: {}", e)))
}

/// Validate a 20-byte hex address
pub fn validate_address(address: &str) -> Result<(), ChainError> {
    let body = address
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidAddress(address.to_string()))?;
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChainError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

fn word(data: &[u8], index: usize) -> Result<&[u8], ChainError> {
    let start = index * WORD;
    data.get(start..start + WORD).ok_or_else(|| {
        ChainError::InvalidResponse(format!(
            "expected at least {} words, got {} bytes",
            index + 1,
            data.len()
        ))
    })
}

/// Decode word `index` as `bool`
pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, ChainError> {
    let w = word(data, index)?;
    if w[..WORD - 1].iter().any(|b| *b != 0) || w[WORD - 1] > 1 {
        return Err(ChainError::InvalidResponse("non-canonical bool".to_string()));
    }
    Ok(w[WORD - 1] == 1)
}

/// Decode word `index` as `uint256`, rejecting values above `u128::MAX`
pub fn decode_u128(data: &[u8], index: usize) -> Result<u128, ChainError> {
    let w = word(data, index)?;
    if w[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::Overflow("uint256"));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&w[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Decode word `index` as `int256`, rejecting values outside `i128`
pub fn decode_i128(data: &[u8], index: usize) -> Result<i128, ChainError> {
    let w = word(data, index)?;
    let mut low = [0u8; 16];
    low.copy_from_slice(&w[16..]);
    let value = i128::from_be_bytes(low);

    let extension = if value < 0 { 0xff } else { 0x00 };
    if w[..16].iter().any(|b| *b != extension) {
        return Err(ChainError::Overflow("int256"));
    }
    Ok(value)
}

/// Decode word `index` as a `u64` (block numbers, timestamps)
pub fn decode_u64(data: &[u8], index: usize) -> Result<u64, ChainError> {
    let value = decode_u128(data, index)?;
    u64::try_from(value).map_err(|_| ChainError::Overflow("uint64"))
}

/// Encode words for tests and mocks
pub fn encode_words(words: &[i128]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * WORD);
    for value in words {
        let fill = if *value < 0 { 0xff } else { 0x00 };
        out.extend_from_slice(&[fill; 16]);
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}

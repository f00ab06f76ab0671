//! Guard errors
//!
//! None of these reach callers of `verify_ownership`; they surface from
//! construction and configuration, or are folded into the fail-safe result.

use thiserror::Error;

use rwaguard_chain::ChainError;
use rwaguard_core::CoreError;
use rwaguard_registry::RegistryError;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    #[error("Asset lookup failed: {0}")]
    Asset(#[from] CoreError),

    #[error("Registry client error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Chain client error: {0}")]
    Chain(#[from] ChainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type GuardResult<T> = Result<T, GuardError>;

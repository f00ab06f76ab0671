//! Core errors

use thiserror::Error;

/// Errors raised by core ports
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Asset repository error: {0}")]
    Repository(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

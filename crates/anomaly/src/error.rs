//! Anomaly detection errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("Transfer store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Transfer store query failed: {0}")]
    Query(String),

    #[error("Invalid transfer data: {0}")]
    InvalidData(String),
}

pub type AnomalyResult<T> = Result<T, AnomalyError>;

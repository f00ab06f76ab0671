//! Registry error types

use thiserror::Error;

/// Land registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No endpoint configured for the jurisdiction
    #[error("No land registry configured for jurisdiction {0}")]
    NotConfigured(String),

    /// Endpoint URL cannot carry a path
    #[error("Invalid registry endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Registry request timed out after {0}ms")]
    Timeout(u64),

    #[error("Registry returned HTTP {status} for {reference}")]
    Status { status: u16, reference: String },

    #[error("Registry request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Registry response could not be decoded: {0}")]
    Decode(String),
}

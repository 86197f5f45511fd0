//! Error types for reasoner operations.

use thiserror::Error;

/// Errors that can occur while calling a reasoning-service backend.
#[derive(Debug, Error)]
pub enum ReasonerError {
    /// The reasoner could not be constructed from its configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing service could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered but the reply could not be used.
    #[error("inference failed: {0}")]
    ProcessingFailed(String),

    /// The reasoner is temporarily unavailable.
    #[error("reasoner unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("inference timed out")]
    Timeout,
}

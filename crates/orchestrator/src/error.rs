//! Turn-level error taxonomy.

use reasoner_core::ReasonerError;
use thiserror::Error;

/// Errors that end up on `TurnState.error_message`.
///
/// These are recorded as data and folded into the user-visible reply; they
/// never abort the session. Dataset load failures and missing configuration
/// are handled before a session exists and do not appear here.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The reasoning service call failed or timed out.
    #[error("reasoning service error: {0}")]
    ReasoningService(#[from] ReasonerError),

    /// The reasoning service failed to return usable code text.
    #[error("code generation failed: {0}")]
    CodeGeneration(String),
}

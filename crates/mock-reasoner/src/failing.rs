//! Failing reasoner - always errors.

use async_trait::async_trait;
use reasoner_core::{PromptContext, Reasoner, ReasonerError};

/// A reasoner that fails every call.
///
/// Used to exercise the error paths of the orchestrator (routing failures,
/// code-generation failures, synthesis failures).
#[derive(Debug, Clone)]
pub struct FailingReasoner {
    message: String,
}

impl Default for FailingReasoner {
    fn default() -> Self {
        Self::new("mock failure")
    }
}

impl FailingReasoner {
    /// Create a reasoner that fails with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Reasoner for FailingReasoner {
    async fn infer(&self, _context: &PromptContext) -> Result<String, ReasonerError> {
        Err(ReasonerError::ProcessingFailed(self.message.clone()))
    }

    fn name(&self) -> &str {
        "FailingReasoner"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

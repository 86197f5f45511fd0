//! The Reasoner trait definition.

use async_trait::async_trait;

use crate::context::PromptContext;
use crate::error::ReasonerError;

/// A trait for turning a prompt context into free text.
///
/// Implementations range from deterministic test stubs to remote LLM
/// backends. The trait is object-safe and can be used with `Arc<dyn
/// Reasoner>`. Callers must treat the returned text as untrusted: it may be
/// empty, wrapped in markdown, or unrelated to what was asked.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Run one inference over the given context and return the reply text.
    async fn infer(&self, context: &PromptContext) -> Result<String, ReasonerError>;

    /// Get a human-readable name for this reasoner implementation.
    fn name(&self) -> &str;

    /// Check if the reasoner is ready to serve calls.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

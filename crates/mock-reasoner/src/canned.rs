//! Canned reasoner - always returns the same reply.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reasoner_core::{PromptContext, Reasoner, ReasonerError};

/// A reasoner that returns the same reply for every call.
///
/// Useful for pinning a single routing decision or synthesis text in tests.
#[derive(Debug, Default)]
pub struct CannedReasoner {
    reply: String,
    calls: AtomicUsize,
}

impl CannedReasoner {
    /// Create a reasoner that always replies with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `infer` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reasoner for CannedReasoner {
    async fn infer(&self, _context: &PromptContext) -> Result<String, ReasonerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "CannedReasoner"
    }
}

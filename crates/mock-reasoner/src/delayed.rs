//! Delayed reasoner - replies after a fixed delay.

use std::time::Duration;

use async_trait::async_trait;
use reasoner_core::{PromptContext, Reasoner, ReasonerError};

/// A reasoner that sleeps before replying.
///
/// Used to exercise timeout handling in the orchestrator.
#[derive(Debug, Clone)]
pub struct DelayedReasoner {
    delay: Duration,
    reply: String,
}

impl DelayedReasoner {
    /// Create a reasoner that waits `delay` before replying with `reply`.
    pub fn new(delay: Duration, reply: impl Into<String>) -> Self {
        Self {
            delay,
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Reasoner for DelayedReasoner {
    async fn infer(&self, _context: &PromptContext) -> Result<String, ReasonerError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "DelayedReasoner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_after_delay() {
        let reasoner = DelayedReasoner::new(Duration::from_millis(5), "done");
        let ctx = PromptContext::new("sys");
        assert_eq!(reasoner.infer(&ctx).await.unwrap(), "done");
    }
}

//! Scripted reasoner - returns queued replies in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reasoner_core::{PromptContext, Reasoner, ReasonerError};
use tokio::sync::Mutex;

/// A reasoner that pops queued replies in order.
///
/// Each `infer` call consumes the next reply. An exhausted queue is an
/// `Unavailable` error, which makes over-consumption visible in tests
/// instead of silently repeating.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedReasoner {
    /// Create a scripted reasoner with the given replies, in call order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append a reply to the end of the script.
    pub async fn push(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(reply.into());
    }

    /// Number of times `infer` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of replies left in the script.
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn infer(&self, _context: &PromptContext) -> Result<String, ReasonerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| ReasonerError::Unavailable("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "ScriptedReasoner"
    }
}

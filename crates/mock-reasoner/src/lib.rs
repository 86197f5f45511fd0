//! Mock reasoner implementations for testing.
//!
//! These stubs make every orchestration path testable without a live
//! reasoning service:
//!
//! - [`CannedReasoner`] - always returns the same reply
//! - [`ScriptedReasoner`] - returns queued replies in order
//! - [`FailingReasoner`] - always fails
//! - [`DelayedReasoner`] - replies after a fixed delay

mod canned;
mod delayed;
mod failing;
mod scripted;

pub use canned::CannedReasoner;
pub use delayed::DelayedReasoner;
pub use failing::FailingReasoner;
pub use scripted::ScriptedReasoner;

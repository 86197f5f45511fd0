//! Turn orchestration for the Glean analysis assistant.
//!
//! Each user question runs exactly once through a four-state machine:
//!
//! ```text
//! INGEST -> ROUTE -> { GENERATE_AND_EXECUTE | SYNTHESIZE | TERMINAL }
//!                      GENERATE_AND_EXECUTE -> SYNTHESIZE -> TERMINAL
//! ```
//!
//! The routing step classifies the question through the reasoning service
//! into a closed three-way decision; anything unrecognizable fails closed
//! into `End`, so the machine always reaches TERMINAL. Component failures
//! become data on the [`TurnState`] (execution results, error messages) and
//! flow into the next user-visible answer instead of aborting the session.
//!
//! [`Session`] owns the dataset, the cached profile, and the append-only
//! conversation history, and folds each finished turn back into that state.

mod error;
mod machine;
mod prompts;
mod session;
mod state;

pub use error::TurnError;
pub use machine::Orchestrator;
pub use prompts::{
    strip_code_fences, CODEGEN_SYSTEM_PROMPT, ROUTING_SYSTEM_PROMPT, SYNTHESIS_SYSTEM_PROMPT,
};
pub use session::{Session, TurnReply};
pub use state::{RoutingDecision, TurnState};

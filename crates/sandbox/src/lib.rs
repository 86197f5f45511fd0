//! Isolated execution of machine-generated analysis code.
//!
//! # Architecture Notes
//!
//! Every execution gets a fresh Lua interpreter with dangerous globals
//! removed and exactly two bindings installed: `df`, a private deep copy of
//! the session dataset, and `chart`, a drawing surface owned by the call.
//! Nothing a script does can reach the filesystem, the network, or any state
//! outside its own interpreter, and the interpreter is dropped when the call
//! returns - there is no rendering context shared between executions.
//!
//! Ceilings (instruction budget, wall-clock deadline, allocation limit) are
//! enforced by the host via a VM hook and the Lua allocator, not by the
//! executed code.

mod chart;
mod frame;
mod result;
mod runtime;

pub use chart::ChartSpec;
pub use result::ExecutionResult;
pub use runtime::{Sandbox, SandboxLimits};

//! Core trait and types for reasoner implementations.
//!
//! This crate provides the shared interface for every reasoning-service
//! backend in the Glean analysis assistant. It defines:
//!
//! - [`Reasoner`] - The trait all reasoner implementations must implement
//! - [`PromptContext`] - Structured prompt input (system text plus labeled sections)
//! - [`ReasonerError`] - Error types for reasoner operations
//!
//! # Example
//!
//! ```rust
//! use reasoner_core::{async_trait, PromptContext, Reasoner, ReasonerError};
//!
//! struct MyReasoner;
//!
//! #[async_trait]
//! impl Reasoner for MyReasoner {
//!     async fn infer(&self, _context: &PromptContext) -> Result<String, ReasonerError> {
//!         Ok("synthesize".to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyReasoner"
//!     }
//! }
//! ```

mod context;
mod error;
mod trait_def;

pub use context::PromptContext;
pub use error::ReasonerError;
pub use trait_def::Reasoner;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

//! Gemini-backed reasoner implementation.
//!
//! [`GeminiReasoner`] implements the [`reasoner_core::Reasoner`] trait over
//! the Gemini `generateContent` REST API. Configuration comes from the
//! environment (see [`GeminiConfig::from_env`]); a missing `GOOGLE_API_KEY`
//! fails construction immediately so a misconfigured process never reaches
//! its first turn.

mod api_types;
mod config;
mod reasoner;

pub use config::GeminiConfig;
pub use reasoner::GeminiReasoner;

//! Smoke-test the Gemini reasoner against the live API.
//!
//! Usage:
//!   GOOGLE_API_KEY=... cargo run --example test_chat -- "your question"

use gemini_reasoner::GeminiReasoner;
use reasoner_core::{PromptContext, Reasoner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Say hello in one short sentence.".to_string());

    let reasoner = GeminiReasoner::from_env()?;
    println!("Using {} ({})", reasoner.name(), reasoner.config().model);

    let context = PromptContext::new("You are a helpful assistant. Be brief.")
        .section("question", question);

    let reply = reasoner.infer(&context).await?;
    println!("{}", reply);

    Ok(())
}

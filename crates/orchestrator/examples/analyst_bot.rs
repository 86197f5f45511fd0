//! Interactive analysis session over a CSV file, answered by Gemini.
//!
//! Usage:
//!   GOOGLE_API_KEY=... cargo run --example analyst_bot -- data.csv
//!
//! Charts are written next to the working directory as chart-<turn>.png.

use std::io::{self, BufRead, Write};

use gemini_reasoner::GeminiReasoner;
use orchestrator::{Orchestrator, Session};
use sandbox::Sandbox;
use tabular::Dataset;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: analyst_bot <dataset.csv>")?;

    // Both of these fail fast: a bad dataset or a missing GOOGLE_API_KEY
    // stops the process before any turn runs.
    let dataset = Dataset::from_csv_path(&path)?;
    let reasoner = GeminiReasoner::from_env()?;

    println!(
        "Loaded {} ({} rows, {} columns). Ask away; empty line quits.",
        path,
        dataset.row_count(),
        dataset.column_count()
    );

    let mut session = Session::new(Orchestrator::new(reasoner, Sandbox::new()), dataset);
    let stdin = io::stdin();
    let mut turn = 0usize;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut question = String::new();
        if stdin.lock().read_line(&mut question)? == 0 {
            break;
        }
        let question = question.trim();
        if question.is_empty() {
            break;
        }

        turn += 1;
        let reply = session.ask(question).await;

        if let Some(text) = &reply.text {
            println!("{}", text);
        }
        if let Some(error) = &reply.error {
            println!("(error: {})", error);
        }
        if let Some(image) = &reply.image {
            let file = format!("chart-{}.png", turn);
            std::fs::write(&file, image)?;
            println!("(chart written to {})", file);
        }
        if reply.text.is_none() && reply.error.is_none() {
            println!("(conversation ended)");
            break;
        }
    }

    Ok(())
}

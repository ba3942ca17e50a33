//! Command-line front end for websift.
//!
//! Reads its configuration from environment variables (see
//! [`Settings::from_env`]); the chat model key comes from
//! `WEBSIFT_MODEL_API_KEY` or `OPENROUTER_KEY`.
//!
//! ```sh
//! # Print the evidence set as JSON
//! websift retrieve "Who won the 2024 Tour de France?"
//!
//! # Answer with injected evidence, or let the model call web_search
//! websift ask "Who won the 2024 Tour de France?"
//! websift ask --tools "Who won the 2024 Tour de France?"
//! ```

use clap::{Parser, Subcommand};
use websift::api::init_logging;
use websift::prelude::*;

/// Web evidence retrieval with token-budget compression.
#[derive(Parser)]
#[command(name = "websift", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the compressed evidence set for a question as JSON.
    Retrieve {
        /// The question to gather evidence for.
        question: String,
    },
    /// Answer a question using web evidence.
    Ask {
        /// The question to answer.
        question: String,
        /// Let the model call `web_search` itself instead of retrieving up front.
        #[arg(long)]
        tools: bool,
    },
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {context}: {err}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging("info");

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => fail("invalid configuration", e),
    };

    match cli.command {
        Command::Retrieve { question } => {
            let retriever = match settings.build_retriever() {
                Ok(r) => r,
                Err(e) => fail("failed to build retriever", e),
            };
            let evidence = retriever.retrieve(&Query::new(question)).await;
            match serde_json::to_string_pretty(&evidence) {
                Ok(json) => println!("{json}"),
                Err(e) => fail("failed to encode evidence", e),
            }
        }
        Command::Ask { question, tools } => {
            let mode = if tools {
                AssistantMode::Tools
            } else {
                AssistantMode::Retrieval
            };
            let assistant = match settings.build_assistant(mode) {
                Ok(a) => a,
                Err(e) => fail("failed to build assistant", e),
            };
            match assistant.answer(&question).await {
                Ok(answer) => println!("{answer}"),
                Err(e) => fail("failed to answer", e),
            }
        }
    }
}

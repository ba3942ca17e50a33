//! Question-answering web service.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... websift-web
//! OPENROUTER_KEY=sk-... websift-web --port 9000 --tools
//! curl 'http://127.0.0.1:3000/web-search-agent?question=Who+won+the+2024+Tour+de+France%3F'
//! ```
//!
//! Search, embedding and model endpoints come from the same environment
//! variables as the `websift` CLI.

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use websift::api::init_logging;
use websift::config::{AssistantMode, Settings};
use websift_web::{DEFAULT_PORT, WebConfig, spawn_web};

/// Answer questions over HTTP using web evidence.
#[derive(Parser)]
#[command(name = "websift-web", version)]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Let the model call `web_search` itself instead of retrieving up front.
    #[arg(long)]
    tools: bool,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    init_logging("info");

    let settings = Settings::from_env().map_err(|e| e.to_string())?;
    let mode = if args.tools {
        AssistantMode::Tools
    } else {
        AssistantMode::Retrieval
    };
    let assistant = settings.build_assistant(mode).map_err(|e| e.to_string())?;

    let config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
    };
    let addr = spawn_web(assistant, config)
        .await
        .map_err(|e| format!("failed to bind: {e}"))?;
    println!("Listening on http://{addr}/web-search-agent");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for Ctrl-C: {e}"))?;
    Ok(())
}

//! HTTP endpoint for websift question answering.
//!
//! Exposes one route:
//!
//! ```text
//! GET /web-search-agent?question=…  →  200 {"answer": "…"}
//!                                      400 {"answer": "Error during web searching. Please try again."}
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! use websift::prelude::*;
//! use websift_web::{WebConfig, spawn_web};
//!
//! let assistant = Settings::from_env()?.build_assistant(AssistantMode::Retrieval)?;
//! let addr = spawn_web(assistant, WebConfig::default()).await?;
//! println!("listening on http://{addr}");
//! ```

mod api;
mod server;

pub use api::{AnswerResponse, ERROR_ANSWER};

use std::net::SocketAddr;
use std::sync::Arc;

use websift::agent::GenerateAnswer;

/// Default listening port. SearXNG conventionally takes 8080.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Port 0 picks a free port. Default: `127.0.0.1:3000`.
    pub bind_addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(
    assistant: Arc<dyn GenerateAnswer>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(api::AppState { assistant });
    server::start_server(router, config.bind_addr).await
}

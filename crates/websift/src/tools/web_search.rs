//! `web_search`: lets the model pull fresh evidence mid-conversation.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::core::{Tool, ToolFuture, parse_tool_args};
use crate::context::Query;
use crate::retrieval::EvidenceSource;
use crate::{ToolDef, json_schema_for};

pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Typed arguments for `web_search`.
#[derive(Deserialize, JsonSchema)]
pub struct WebSearchArgs {
    /// What to look up on the web (e.g. 'Tour de France 2024 winner').
    pub query: String,
}

/// Runs the full evidence pipeline and returns the evidence texts as a
/// JSON array of strings.
pub struct WebSearchTool {
    source: Arc<dyn EvidenceSource>,
}

impl WebSearchTool {
    pub fn new(source: Arc<dyn EvidenceSource>) -> Self {
        Self { source }
    }
}

impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            WEB_SEARCH_TOOL,
            "Search the web for extra information needed to answer the question. \
             Returns a JSON array of relevant text passages (empty when nothing was found).",
            json_schema_for::<WebSearchArgs>(),
        )
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<WebSearchArgs>(arguments);
        Box::pin(async move {
            let args = match parsed {
                Ok(a) => a,
                Err(e) => return e,
            };
            if args.query.trim().is_empty() {
                return "Error: 'query' must not be empty".to_string();
            }
            let evidence = self.source.retrieve(&Query::new(args.query.trim())).await;
            info!("web_search {:?}: {} passage(s)", args.query, evidence.len());
            let texts: Vec<&str> = evidence.iter().map(|item| item.text.as_str()).collect();
            serde_json::to_string(&texts)
                .unwrap_or_else(|e| format!("Error: failed to encode results: {e}"))
        })
    }
}

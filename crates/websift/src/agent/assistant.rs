//! Answer generation on top of the evidence pipeline.
//!
//! Two strategies:
//!
//! - [`RetrievalAssistant`] always retrieves first and injects the evidence
//!   into the user message before a single model call.
//! - [`ToolAssistant`] gives the model a `web_search` tool and lets it decide
//!   when (and how often) to search.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use super::prompt;
use crate::context::Query;
use crate::error::{Error, Result};
use crate::retrieval::EvidenceSource;
use crate::tools::{ToolSet, WebSearchTool};
use crate::{ChatClient, ChatRequest, DEFAULT_MODEL, Message};

/// Default cap on model ↔ tool round trips.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

pub type AnswerFuture<'a> = BoxFuture<'a, Result<String>>;

/// Produces a final answer for a question.
pub trait GenerateAnswer: Send + Sync {
    fn answer<'a>(&'a self, question: &'a str) -> AnswerFuture<'a>;
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

// ── Retrieval-augmented ────────────────────────────────────────────

pub struct RetrievalAssistant {
    client: Arc<ChatClient>,
    source: Arc<dyn EvidenceSource>,
    model: String,
    max_tokens: u32,
}

impl RetrievalAssistant {
    pub fn new(client: Arc<ChatClient>, source: Arc<dyn EvidenceSource>) -> Self {
        Self {
            client,
            source,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Cap the answer length. Zero leaves it to the provider.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl GenerateAnswer for RetrievalAssistant {
    fn answer<'a>(&'a self, question: &'a str) -> AnswerFuture<'a> {
        Box::pin(async move {
            let evidence = self.source.retrieve(&Query::new(question)).await;
            info!("answering with {} evidence item(s)", evidence.len());
            let request = ChatRequest {
                model: self.model.clone(),
                messages: vec![
                    Message::system(prompt::ANSWER_SYSTEM_PROMPT),
                    Message::user(prompt::inject_evidence(question, &evidence)),
                ],
                max_tokens: self.max_tokens,
                ..Default::default()
            };
            let completion = self.client.chat(&request).await?;
            non_blank(completion.content)
                .ok_or_else(|| Error::Api("model returned an empty answer".into()))
        })
    }
}

// ── Tool-calling ───────────────────────────────────────────────────

pub struct ToolAssistant {
    client: Arc<ChatClient>,
    tools: ToolSet,
    model: String,
    max_rounds: usize,
}

impl ToolAssistant {
    /// Assistant with only the `web_search` tool, backed by `source`.
    pub fn new(client: Arc<ChatClient>, source: Arc<dyn EvidenceSource>) -> Self {
        Self::with_tools(client, ToolSet::new().with(WebSearchTool::new(source)))
    }

    pub fn with_tools(client: Arc<ChatClient>, tools: ToolSet) -> Self {
        Self {
            client,
            tools,
            model: DEFAULT_MODEL.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Deadline for each tool call. `None` lets tools run unbounded.
    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tools = self.tools.with_default_timeout(timeout);
        self
    }

    /// At least one round always runs.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }
}

impl GenerateAnswer for ToolAssistant {
    fn answer<'a>(&'a self, question: &'a str) -> AnswerFuture<'a> {
        Box::pin(async move {
            let mut request = ChatRequest {
                model: self.model.clone(),
                messages: vec![
                    Message::system(prompt::TOOL_SYSTEM_PROMPT),
                    Message::user(question),
                ],
                tools: Some(self.tools.definitions()),
                ..Default::default()
            };
            let mut last_text = None;

            for round in 1..=self.max_rounds {
                let completion = self.client.chat(&request).await?;
                let text = non_blank(completion.content);
                if completion.tool_calls.is_empty() {
                    return text
                        .ok_or_else(|| Error::Api("model returned an empty answer".into()));
                }
                if text.is_some() {
                    last_text = text;
                }

                debug!(
                    "round {round}: {} tool call(s)",
                    completion.tool_calls.len()
                );
                let calls = completion.tool_calls;
                request.messages.push(Message::assistant_tool_calls(calls.clone()));
                for call in &calls {
                    let result = self
                        .tools
                        .execute(&call.function.name, &call.function.arguments)
                        .await;
                    request.messages.push(Message::tool_result(&call.id, result));
                }
            }

            warn!("no final answer after {} round(s)", self.max_rounds);
            last_text.ok_or_else(|| {
                Error::Api(format!(
                    "no answer after {} tool round(s)",
                    self.max_rounds
                ))
            })
        })
    }
}

//! Relevance filtering: keep only what helps answer the question.
//!
//! [`FilterRelevance`] is the model capability (one extraction call);
//! [`RelevanceStage`] wraps it with the pipeline's rules: blank inputs are
//! skipped, failures and timeouts become "no evidence", and the output
//! carries merged metadata when several items were filtered together.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::prompt;
use crate::context::{ContentItem, Metadata, Query};
use crate::error::{Error, Result, with_timeout};
use crate::{
    ChatClient, ChatRequest, DEFAULT_MODEL, Message, PREPROCESSING_MAX_TOKENS, ResponseFormat,
};

/// Default deadline for one relevance extraction.
pub const DEFAULT_FILTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Structured output of a relevance extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FilterResponse {
    /// Only the information needed to answer the question; empty when
    /// nothing in the data is relevant.
    pub extracted_data: String,
}

pub type FilterFuture<'a> = BoxFuture<'a, Result<FilterResponse>>;

/// Extracts the question-relevant part of one or more text spans.
pub trait FilterRelevance: Send + Sync {
    fn filter_relevance<'a>(&'a self, question: &'a str, data: &'a [String]) -> FilterFuture<'a>;
}

// ── LLM-backed filter ──────────────────────────────────────────────

/// Relevance filter backed by a chat model with strict JSON output.
pub struct LlmRelevanceFilter {
    client: Arc<ChatClient>,
    model: String,
    max_tokens: u32,
}

impl LlmRelevanceFilter {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: PREPROCESSING_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl FilterRelevance for LlmRelevanceFilter {
    fn filter_relevance<'a>(&'a self, question: &'a str, data: &'a [String]) -> FilterFuture<'a> {
        Box::pin(async move {
            let (system, user) = prompt::filter_request(question, data);
            let request = ChatRequest {
                model: self.model.clone(),
                messages: vec![Message::system(system), Message::user(user)],
                max_tokens: self.max_tokens,
                temperature: Some(0.0),
                response_format: Some(ResponseFormat::strict_schema_for::<FilterResponse>(
                    "relevant_information",
                )),
                ..Default::default()
            };
            let completion = self.client.chat(&request).await?;
            let content = completion
                .content
                .ok_or_else(|| Error::Api("model returned no content".into()))?;
            parse_filter_response(&content)
        })
    }
}

/// Parse the model's JSON, tolerating a surrounding markdown code fence.
fn parse_filter_response(content: &str) -> Result<FilterResponse> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(unfenced.trim())?)
}

// ── Pipeline stage ─────────────────────────────────────────────────

/// Runs a [`FilterRelevance`] over one item or a batch of items.
#[derive(Clone)]
pub struct RelevanceStage {
    filter: Arc<dyn FilterRelevance>,
    timeout: Duration,
}

impl RelevanceStage {
    pub fn new(filter: Arc<dyn FilterRelevance>) -> Self {
        Self {
            filter,
            timeout: DEFAULT_FILTER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Filter `items` as one unit.
    ///
    /// Returns `None` when no input has text, when the filter fails or times
    /// out, or when the extraction is blank.
    pub async fn filter(&self, query: &Query, items: &[ContentItem]) -> Option<ContentItem> {
        let inputs: Vec<&ContentItem> = items.iter().filter(|i| !i.is_blank()).collect();
        if inputs.is_empty() {
            return None;
        }
        let data: Vec<String> = inputs.iter().map(|i| i.text.clone()).collect();

        let response = match with_timeout(
            self.timeout,
            self.filter.filter_relevance(query.text(), &data),
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "relevance filter failed for {}: {e}",
                    describe_sources(&inputs)
                );
                return None;
            }
        };

        let extracted = response.extracted_data.trim();
        if extracted.is_empty() {
            debug!("nothing relevant in {}", describe_sources(&inputs));
            return None;
        }

        let metadata = match inputs.as_slice() {
            [single] => single.metadata.clone(),
            many => Metadata::combined(many.iter().map(|i| &i.metadata)),
        };
        Some(ContentItem::new(extracted, metadata))
    }
}

fn describe_sources(items: &[&ContentItem]) -> String {
    match items {
        [single] => single.source().unwrap_or("<unknown>").to_string(),
        many => format!("batch of {}", many.len()),
    }
}

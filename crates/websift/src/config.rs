//! Configuration: pipeline tuning and the environment-driven wiring.
//!
//! [`PipelineConfig`] holds the budget, grouping constants, concurrency and
//! timeouts of one [`Retriever`]. [`Settings`] adds the endpoints and keys
//! of the concrete collaborators and builds a ready-to-use retriever or
//! assistant via [`build_retriever`](Settings::build_retriever) and
//! [`build_assistant`](Settings::build_assistant).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{GenerateAnswer, RetrievalAssistant, ToolAssistant};
use crate::context::TokenBudget;
use crate::error::{Error, Result};
use crate::index::embedding::{DEFAULT_EMBEDDING_MODEL, OPENAI_EMBEDDINGS_URL};
use crate::index::{EmbeddingIndexProvider, OpenAiEmbedder};
use crate::retrieval::collector::{
    DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RESULTS, DEFAULT_SEARCH_TIMEOUT,
};
use crate::retrieval::compressor::{
    DEFAULT_GROUP_SIZE, DEFAULT_INDEX_TIMEOUT, DEFAULT_MIN_SENTENCE_CHARS, DEFAULT_TOP_K,
};
use crate::retrieval::relevance::DEFAULT_FILTER_TIMEOUT;
use crate::retrieval::{Collaborators, EvidenceSource, LlmRelevanceFilter, Retriever};
use crate::web::{BraveSearch, HttpFetcher, SearchEngine, SearxngSearch};
use crate::{ChatClient, DEFAULT_MODEL, OPENROUTER_URL};

// ── Pipeline ───────────────────────────────────────────────────────

/// Tuning for one [`Retriever`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Aggregate and per-item token ceilings. Default: 8000 / 1000.
    pub budget: TokenBudget,
    /// Search hits to collect. Default: `3`.
    pub max_results: usize,
    /// Items processed at once within a stage. Default: `4`.
    pub concurrency: usize,
    /// Sentences this short (in chars) or shorter are dropped before
    /// compression. Default: `10`.
    pub min_sentence_chars: usize,
    /// Sentences per indexed group. Default: `15`.
    pub group_size: usize,
    /// Groups kept per compression. Default: `3`.
    pub top_k: usize,
    pub search_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Ingest plus query, per compression.
    pub index_timeout: Duration,
    pub filter_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            budget: TokenBudget::default(),
            max_results: DEFAULT_MAX_RESULTS,
            concurrency: DEFAULT_CONCURRENCY,
            min_sentence_chars: DEFAULT_MIN_SENTENCE_CHARS,
            group_size: DEFAULT_GROUP_SIZE,
            top_k: DEFAULT_TOP_K,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            index_timeout: DEFAULT_INDEX_TIMEOUT,
            filter_timeout: DEFAULT_FILTER_TIMEOUT,
        }
    }
}

/// Added to the summed stage timeouts for local work between calls.
const DEADLINE_SLACK: Duration = Duration::from_secs(5);

impl PipelineConfig {
    /// Upper bound on one retrieval: search, fetch, index, the per-item
    /// filter and one batch filter, run back to back. Callers that wrap
    /// `retrieve` in their own timeout should allow at least this much.
    pub fn retrieval_deadline(&self) -> Duration {
        self.search_timeout
            + self.fetch_timeout
            + self.index_timeout
            + self.filter_timeout * 2
            + DEADLINE_SLACK
    }

    /// Ceilings of zero are raised to one token.
    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = TokenBudget::new(budget.aggregate_max.max(1), budget.item_max.max(1));
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_min_sentence_chars(mut self, chars: usize) -> Self {
        self.min_sentence_chars = chars;
        self
    }

    pub fn with_group_size(mut self, size: usize) -> Self {
        self.group_size = size.max(1);
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = timeout;
        self
    }

    pub fn with_filter_timeout(mut self, timeout: Duration) -> Self {
        self.filter_timeout = timeout;
        self
    }
}

// ── Settings ───────────────────────────────────────────────────────

pub const DEFAULT_SEARXNG_URL: &str = "http://localhost:8080";

/// Which search backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBackend {
    #[default]
    Searxng,
    Brave,
}

impl FromStr for SearchBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "searxng" => Ok(SearchBackend::Searxng),
            "brave" => Ok(SearchBackend::Brave),
            other => Err(Error::Config(format!(
                "unknown search engine '{other}' (expected 'searxng' or 'brave')"
            ))),
        }
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::Searxng => write!(f, "searxng"),
            SearchBackend::Brave => write!(f, "brave"),
        }
    }
}

/// How answers are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssistantMode {
    /// Retrieve first, inject evidence, one model call.
    #[default]
    Retrieval,
    /// The model calls `web_search` when it wants.
    Tools,
}

/// Endpoints, keys and pipeline tuning for a full deployment.
#[derive(Clone)]
pub struct Settings {
    pub model_url: String,
    pub model_api_key: String,
    /// Model for answers and relevance filtering.
    pub model: String,
    /// Model for the tool-calling assistant.
    pub tool_model: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: String,
    pub search_backend: SearchBackend,
    pub search_url: String,
    pub brave_api_key: Option<String>,
    pub pipeline: PipelineConfig,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("model_url", &self.model_url)
            .field("model", &self.model)
            .field("tool_model", &self.tool_model)
            .field("embedding_url", &self.embedding_url)
            .field("embedding_model", &self.embedding_model)
            .field("search_backend", &self.search_backend)
            .field("search_url", &self.search_url)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_url: OPENROUTER_URL.to_string(),
            model_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            tool_model: DEFAULT_MODEL.to_string(),
            embedding_url: OPENAI_EMBEDDINGS_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: String::new(),
            search_backend: SearchBackend::default(),
            search_url: DEFAULT_SEARXNG_URL.to_string(),
            brave_api_key: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` (variable name → value). Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let model_api_key = get("WEBSIFT_MODEL_API_KEY")
            .or_else(|| get("OPENROUTER_KEY"))
            .ok_or_else(|| {
                Error::Config(
                    "set WEBSIFT_MODEL_API_KEY (or OPENROUTER_KEY) to the chat model API key"
                        .into(),
                )
            })?;
        let model = get("WEBSIFT_MODEL_NAME").unwrap_or(defaults.model);
        let tool_model = get("WEBSIFT_TOOL_MODEL_NAME").unwrap_or_else(|| model.clone());
        let embedding_api_key =
            get("WEBSIFT_EMBEDDING_API_KEY").unwrap_or_else(|| model_api_key.clone());
        let search_backend = match get("WEBSIFT_SEARCH_ENGINE") {
            Some(name) => name.parse()?,
            None => SearchBackend::default(),
        };
        let max_results = match get("WEBSIFT_MAX_RESULTS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("WEBSIFT_MAX_RESULTS must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_MAX_RESULTS,
        };

        Ok(Self {
            model_url: get("WEBSIFT_MODEL_URL").unwrap_or(defaults.model_url),
            model_api_key,
            model,
            tool_model,
            embedding_url: get("WEBSIFT_EMBEDDING_URL").unwrap_or(defaults.embedding_url),
            embedding_model: get("WEBSIFT_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_api_key,
            search_backend,
            search_url: get("WEBSIFT_SEARCH_URL").unwrap_or(defaults.search_url),
            brave_api_key: get("BRAVE_SEARCH_KEY"),
            pipeline: defaults.pipeline.with_max_results(max_results),
        })
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_search_backend(mut self, backend: SearchBackend) -> Self {
        self.search_backend = backend;
        self
    }

    /// Chat client for the configured endpoint.
    pub fn build_chat_client(&self) -> Result<ChatClient> {
        if self.model_api_key.trim().is_empty() {
            return Err(Error::Config("chat model API key is not set".into()));
        }
        Ok(ChatClient::new(self.model_api_key.clone())?.with_url(self.model_url.clone()))
    }

    pub fn build_search_engine(&self) -> Result<Arc<dyn SearchEngine>> {
        match self.search_backend {
            SearchBackend::Searxng => Ok(Arc::new(SearxngSearch::with_timeout(
                self.search_url.clone(),
                self.pipeline.search_timeout,
            )?)),
            SearchBackend::Brave => {
                let key = self.brave_api_key.clone().ok_or_else(|| {
                    Error::Config(
                        "BRAVE_SEARCH_KEY is not set. \
                         Get a free API key at https://brave.com/search/api/"
                            .into(),
                    )
                })?;
                Ok(Arc::new(BraveSearch::with_timeout(
                    key,
                    self.pipeline.search_timeout,
                )?))
            }
        }
    }

    /// A [`Retriever`] wired to the configured search, fetch, embedding and
    /// chat endpoints.
    pub fn build_retriever(&self) -> Result<Retriever> {
        let chat = Arc::new(self.build_chat_client()?);
        self.build_retriever_with(chat)
    }

    fn build_retriever_with(&self, chat: Arc<ChatClient>) -> Result<Retriever> {
        let embedder = OpenAiEmbedder::new(self.embedding_api_key.clone())?
            .with_url(self.embedding_url.clone())
            .with_model(self.embedding_model.clone());
        let parts = Collaborators::new(
            self.build_search_engine()?,
            Arc::new(HttpFetcher::with_timeout(self.pipeline.fetch_timeout)?),
            Arc::new(LlmRelevanceFilter::new(chat).with_model(self.model.clone())),
            Arc::new(EmbeddingIndexProvider::new(Arc::new(embedder))),
        );
        Ok(Retriever::new(parts, &self.pipeline))
    }

    /// An answering assistant for `mode`, sharing one chat client with its
    /// retriever.
    pub fn build_assistant(&self, mode: AssistantMode) -> Result<Arc<dyn GenerateAnswer>> {
        let chat = Arc::new(self.build_chat_client()?);
        let retriever: Arc<dyn EvidenceSource> =
            Arc::new(self.build_retriever_with(Arc::clone(&chat))?);
        Ok(match mode {
            AssistantMode::Retrieval => {
                Arc::new(RetrievalAssistant::new(chat, retriever).with_model(self.model.clone()))
            }
            AssistantMode::Tools => {
                Arc::new(
                    ToolAssistant::new(chat, retriever)
                        .with_model(self.tool_model.clone())
                        .with_tool_timeout(Some(self.pipeline.retrieval_deadline())),
                )
            }
        })
    }
}

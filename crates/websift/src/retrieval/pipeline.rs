//! The retrieval entry point.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{Instrument, debug, error, info, info_span};

use super::collector::EvidenceCollector;
use super::compressor::BudgetCompressor;
use super::reducer::AggregateReducer;
use super::relevance::{FilterRelevance, RelevanceStage};
use crate::api::generate_trace_id;
use crate::config::PipelineConfig;
use crate::context::{CharRatioTokenizer, ContentItem, Query, TokenBudget, Tokenizer};
use crate::index::IndexProvider;
use crate::web::{SearchEngine, WebFetcher};

pub type EvidenceFuture<'a> = BoxFuture<'a, Vec<ContentItem>>;

/// Anything that can produce an evidence set for a question. Never fails:
/// problems surface as fewer (or no) items.
pub trait EvidenceSource: Send + Sync {
    fn retrieve<'a>(&'a self, query: &'a Query) -> EvidenceFuture<'a>;
}

/// The collaborators a [`Retriever`] is built from.
pub struct Collaborators {
    pub search: Arc<dyn SearchEngine>,
    pub fetcher: Arc<dyn WebFetcher>,
    pub filter: Arc<dyn FilterRelevance>,
    pub index_provider: Arc<dyn IndexProvider>,
    pub tokenizer: Arc<dyn Tokenizer>,
}

impl Collaborators {
    /// Uses the default [`CharRatioTokenizer`].
    pub fn new(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn WebFetcher>,
        filter: Arc<dyn FilterRelevance>,
        index_provider: Arc<dyn IndexProvider>,
    ) -> Self {
        Self {
            search,
            fetcher,
            filter,
            index_provider,
            tokenizer: Arc::new(CharRatioTokenizer::default()),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

/// Search, fetch, compress, filter and (if needed) reduce.
///
/// Holds only configuration and shared clients, so one `Retriever` can
/// serve any number of concurrent requests.
pub struct Retriever {
    collector: EvidenceCollector,
    compressor: BudgetCompressor,
    relevance: RelevanceStage,
    reducer: AggregateReducer,
    tokenizer: Arc<dyn Tokenizer>,
    budget: TokenBudget,
    concurrency: usize,
}

impl Retriever {
    pub fn new(parts: Collaborators, config: &PipelineConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        let collector = EvidenceCollector::new(parts.search, parts.fetcher)
            .with_max_results(config.max_results)
            .with_search_timeout(config.search_timeout)
            .with_fetch_timeout(config.fetch_timeout)
            .with_concurrency(concurrency);
        let compressor = BudgetCompressor::new(parts.index_provider, Arc::clone(&parts.tokenizer))
            .with_budget(config.budget)
            .with_min_sentence_chars(config.min_sentence_chars)
            .with_group_size(config.group_size)
            .with_top_k(config.top_k)
            .with_timeout(config.index_timeout);
        let relevance = RelevanceStage::new(parts.filter).with_timeout(config.filter_timeout);
        let reducer = AggregateReducer::new(relevance.clone(), Arc::clone(&parts.tokenizer))
            .with_budget(config.budget)
            .with_concurrency(concurrency);
        Self {
            collector,
            compressor,
            relevance,
            reducer,
            tokenizer: parts.tokenizer,
            budget: config.budget,
            concurrency,
        }
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    /// Evidence for `query`, within the aggregate budget. Never fails.
    pub async fn retrieve(&self, query: &Query) -> Vec<ContentItem> {
        let trace_id = generate_trace_id();
        let span = info_span!("retrieve", %trace_id);
        self.run(query).instrument(span).await
    }

    async fn run(&self, query: &Query) -> Vec<ContentItem> {
        let start = Instant::now();
        info!("retrieving evidence for {:?}", query.text());

        let collected: Vec<ContentItem> =
            guarded("collect", self.collector.collect(query).collect()).await;
        if collected.is_empty() {
            info!("no evidence collected");
            return Vec::new();
        }
        let collected_count = collected.len();

        let items = guarded("refine", self.refine_all(query, collected)).await;
        let total: usize = items
            .iter()
            .map(|item| self.tokenizer.estimate(&item.text))
            .sum();
        let usage = self.budget.usage(total);
        info!(
            "{} of {} item(s) relevant, {}",
            items.len(),
            collected_count,
            usage.to_log_string()
        );

        let items = if usage.over_budget() {
            guarded("reduce", self.reducer.reduce(query, items)).await
        } else {
            items
        };

        info!(
            "retrieved {} item(s) in {:.1}s",
            items.len(),
            start.elapsed().as_secs_f64()
        );
        items
    }

    /// Compress (when over the item ceiling) then filter each item,
    /// concurrently, keeping input order.
    async fn refine_all(&self, query: &Query, items: Vec<ContentItem>) -> Vec<ContentItem> {
        stream::iter(items)
            .map(move |item| self.refine(query, item))
            .buffered(self.concurrency)
            .filter_map(future::ready)
            .collect()
            .await
    }

    async fn refine(&self, query: &Query, item: ContentItem) -> Option<ContentItem> {
        let item = if self.compressor.needs_compression(&item) {
            debug!(
                "{} over item budget, compressing",
                item.source().unwrap_or("<unknown>")
            );
            self.compressor.compress(query, &item).await?
        } else {
            item
        };
        self.relevance
            .filter(query, std::slice::from_ref(&item))
            .await
            .filter(|refined| !refined.is_blank())
    }
}

impl EvidenceSource for Retriever {
    fn retrieve<'a>(&'a self, query: &'a Query) -> EvidenceFuture<'a> {
        Box::pin(Retriever::retrieve(self, query))
    }
}

/// Run one stage; a panic is logged and becomes the empty result.
async fn guarded<T: Default>(stage: &str, fut: impl Future<Output = T>) -> T {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(value) => value,
        Err(panic) => {
            error!("{stage} stage panicked: {}", panic_message(panic.as_ref()));
            T::default()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

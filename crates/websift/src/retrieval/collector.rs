//! Evidence collection: search hits in, content items out.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::context::item::TITLE;
use crate::context::{ContentItem, Metadata, Query};
use crate::error::with_timeout;
use crate::web::{SearchEngine, SearchHit, WebFetcher};

pub const DEFAULT_MAX_RESULTS: usize = 3;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Turns a question into one [`ContentItem`] per search hit.
///
/// Each item starts as the hit's title and snippet; a successful page fetch
/// appends the page text. A failed or empty fetch keeps the snippet text.
pub struct EvidenceCollector {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn WebFetcher>,
    max_results: usize,
    search_timeout: Duration,
    fetch_timeout: Duration,
    concurrency: usize,
}

impl EvidenceCollector {
    pub fn new(search: Arc<dyn SearchEngine>, fetcher: Arc<dyn WebFetcher>) -> Self {
        Self {
            search,
            fetcher,
            max_results: DEFAULT_MAX_RESULTS,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
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

    /// Maximum fetches in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Lazily search and fetch. Fetches run concurrently; items come out in
    /// search ranking order. A failed search yields an empty stream.
    pub fn collect<'a>(&'a self, query: &'a Query) -> BoxStream<'a, ContentItem> {
        stream::once(self.hits(query))
            .flat_map(stream::iter)
            .map(move |hit| self.enrich(hit))
            .buffered(self.concurrency)
            .boxed()
    }

    async fn hits(&self, query: &Query) -> Vec<SearchHit> {
        let search = self.search.search(query.text(), self.max_results);
        match with_timeout(self.search_timeout, search).await {
            Ok(hits) => {
                info!("{} returned {} hit(s)", self.search.name(), hits.len());
                hits
            }
            Err(e) => {
                warn!("{} search failed: {e}", self.search.name());
                Vec::new()
            }
        }
    }

    async fn enrich(&self, hit: SearchHit) -> ContentItem {
        let preview = preview_text(&hit);
        let mut metadata = Metadata::with_source(hit.url.as_str());
        metadata.insert(TITLE, hit.title.as_str());

        let text = match with_timeout(self.fetch_timeout, self.fetcher.fetch(&hit.url)).await {
            Ok(page) if page.trim().is_empty() => {
                debug!("{}: empty page, keeping snippet", hit.url);
                preview
            }
            Ok(page) if preview.is_empty() => page,
            Ok(page) => format!("{preview}\n{page}"),
            Err(e) => {
                warn!("fetch {} failed: {e}; keeping snippet", hit.url);
                preview
            }
        };
        ContentItem::new(text, metadata)
    }
}

/// `title\nsnippet`, leaving out whichever is blank.
fn preview_text(hit: &SearchHit) -> String {
    [hit.title.trim(), hit.snippet.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

//! Fakes for the pipeline collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use websift::config::PipelineConfig;
use websift::context::Tokenizer;
use websift::error::Error;
use websift::index::{IndexFuture, IndexProvider, VectorIndex};
use websift::retrieval::{Collaborators, FilterFuture, FilterRelevance, FilterResponse, Retriever};
use websift::web::{FetchFuture, SearchEngine, SearchFuture, SearchHit, WebFetcher};

/// One token per whitespace-separated word.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn estimate(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

pub fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `n` sentences of five words each.
pub fn sentences(n: usize) -> String {
    (0..n)
        .map(|i| format!("Sentence number {i} says something."))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn hit(url: &str, title: &str, snippet: &str) -> SearchHit {
    SearchHit {
        url: url.into(),
        title: title.into(),
        snippet: snippet.into(),
    }
}

// ── Search ─────────────────────────────────────────────────────────

pub struct StaticSearch(pub Result<Vec<SearchHit>, u16>);

impl SearchEngine for StaticSearch {
    fn search<'a>(&'a self, _query: &'a str, max_results: usize) -> SearchFuture<'a> {
        Box::pin(async move {
            match &self.0 {
                Ok(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
                Err(status) => Err(Error::Http {
                    status: *status,
                    body: String::new(),
                }),
            }
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ── Fetch ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
}

impl MapFetcher {
    pub fn page(mut self, url: &str, text: impl Into<String>) -> Self {
        self.pages.insert(url.into(), text.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl WebFetcher for MapFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.pages.get(url).cloned().ok_or_else(|| Error::Http {
                status: 500,
                body: "fetch failed".into(),
            })
        })
    }
}

// ── Relevance filter ───────────────────────────────────────────────

#[derive(Clone, Copy)]
pub enum Verdict {
    /// Keep everything, space-joined.
    Echo,
    /// Nothing is relevant.
    Blank,
}

pub struct CountingFilter {
    verdict: Verdict,
    calls: AtomicUsize,
    inputs: Mutex<Vec<Vec<String>>>,
}

impl CountingFilter {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<Vec<String>> {
        self.inputs.lock().unwrap().clone()
    }
}

impl FilterRelevance for CountingFilter {
    fn filter_relevance<'a>(&'a self, _question: &'a str, data: &'a [String]) -> FilterFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(data.to_vec());
        let extracted_data = match self.verdict {
            Verdict::Echo => data.join(" "),
            Verdict::Blank => String::new(),
        };
        Box::pin(async move { Ok(FilterResponse { extracted_data }) })
    }
}

// ── Vector index ───────────────────────────────────────────────────

#[derive(Default, Debug)]
pub struct IndexStats {
    pub created: usize,
    pub ingested: usize,
    pub cleared: usize,
    /// Documents held by indices that are still alive.
    pub live: usize,
}

/// Index returning the first `k` documents; optionally slow to query.
pub struct TrackedIndex {
    docs: Vec<String>,
    stats: Arc<Mutex<IndexStats>>,
    query_delay: Option<Duration>,
}

impl VectorIndex for TrackedIndex {
    fn add<'a>(&'a mut self, text: &'a str) -> IndexFuture<'a, ()> {
        self.docs.push(text.to_string());
        let mut stats = self.stats.lock().unwrap();
        stats.ingested += 1;
        stats.live += 1;
        Box::pin(async { Ok(()) })
    }

    fn query<'a>(&'a self, _text: &'a str, k: usize) -> IndexFuture<'a, Vec<String>> {
        Box::pin(async move {
            if let Some(delay) = self.query_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.docs.iter().take(k).cloned().collect())
        })
    }

    fn clear(&mut self) -> IndexFuture<'_, ()> {
        let mut stats = self.stats.lock().unwrap();
        stats.cleared += 1;
        stats.live -= self.docs.len();
        self.docs.clear();
        Box::pin(async { Ok(()) })
    }

    fn len(&self) -> usize {
        self.docs.len()
    }
}

impl Drop for TrackedIndex {
    fn drop(&mut self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.live -= self.docs.len();
        }
    }
}

#[derive(Default)]
pub struct TrackedProvider {
    pub stats: Arc<Mutex<IndexStats>>,
    pub query_delay: Option<Duration>,
}

impl TrackedProvider {
    pub fn stats(&self) -> std::sync::MutexGuard<'_, IndexStats> {
        self.stats.lock().unwrap()
    }
}

impl IndexProvider for TrackedProvider {
    fn create(&self) -> Box<dyn VectorIndex> {
        self.stats.lock().unwrap().created += 1;
        Box::new(TrackedIndex {
            docs: Vec::new(),
            stats: Arc::clone(&self.stats),
            query_delay: self.query_delay,
        })
    }
}

// ── Wiring ─────────────────────────────────────────────────────────

pub fn build(
    search: StaticSearch,
    fetcher: MapFetcher,
    filter: Arc<CountingFilter>,
    index: Arc<TrackedProvider>,
    config: PipelineConfig,
) -> Retriever {
    let parts = Collaborators::new(Arc::new(search), Arc::new(fetcher), filter, index)
        .with_tokenizer(Arc::new(WordTokenizer));
    Retriever::new(parts, &config)
}

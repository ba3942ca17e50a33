//! Hand-written fakes for the pipeline traits, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::context::Tokenizer;
use crate::error::Error;
use crate::index::{IndexFuture, IndexProvider, VectorIndex};
use crate::retrieval::{FilterFuture, FilterRelevance, FilterResponse};
use crate::web::{FetchFuture, SearchEngine, SearchFuture, SearchHit, WebFetcher};

/// One token per whitespace-separated word.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn estimate(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// `n` distinct words.
pub fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

enum FilterMode {
    Echo,
    Blank,
    Fail,
}

/// Scripted relevance filter that records every call.
pub struct ScriptedFilter {
    mode: FilterMode,
    delay: Option<Duration>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<Vec<String>>>,
}

impl ScriptedFilter {
    fn with_mode(mode: FilterMode) -> Self {
        Self {
            mode,
            delay: None,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Returns its input, space-joined.
    pub fn echo() -> Self {
        Self::with_mode(FilterMode::Echo)
    }

    pub fn blank() -> Self {
        Self::with_mode(FilterMode::Blank)
    }

    pub fn failing() -> Self {
        Self::with_mode(FilterMode::Fail)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<Vec<String>> {
        self.inputs.lock().unwrap().clone()
    }
}

impl FilterRelevance for ScriptedFilter {
    fn filter_relevance<'a>(&'a self, _question: &'a str, data: &'a [String]) -> FilterFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(data.to_vec());
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.mode {
                FilterMode::Echo => Ok(FilterResponse {
                    extracted_data: data.join(" "),
                }),
                FilterMode::Blank => Ok(FilterResponse::default()),
                FilterMode::Fail => Err(Error::Api("filter unavailable".into())),
            }
        })
    }
}

/// Fixed hits, or a fixed failure.
pub struct FakeSearch {
    hits: Option<Vec<SearchHit>>,
}

impl FakeSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self { hits: Some(hits) }
    }

    pub fn failing() -> Self {
        Self { hits: None }
    }
}

impl SearchEngine for FakeSearch {
    fn search<'a>(&'a self, _query: &'a str, max_results: usize) -> SearchFuture<'a> {
        Box::pin(async move {
            match &self.hits {
                Some(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
                None => Err(Error::Http {
                    status: 503,
                    body: "search down".into(),
                }),
            }
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn hit(url: &str, title: &str, snippet: &str) -> SearchHit {
    SearchHit {
        url: url.into(),
        title: title.into(),
        snippet: snippet.into(),
    }
}

/// Pages by URL; unknown URLs are a 404. Optional per-URL delay.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
}

impl FakeFetcher {
    pub fn page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.into(), text.into());
        self
    }

    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }
}

impl WebFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.pages.get(url).cloned().ok_or(Error::Http {
                status: 404,
                body: String::new(),
            })
        })
    }
}

/// What a [`RecordingIndexProvider`] saw across all the indices it created.
#[derive(Default, Debug)]
pub struct IndexLog {
    pub created: usize,
    pub ingested: Vec<String>,
    pub queries: Vec<String>,
    pub cleared: usize,
    /// Documents still held by live indices.
    pub live_documents: usize,
}

/// Index whose `query` returns the first `k` documents (or fails).
pub struct RecordingIndex {
    docs: Vec<String>,
    log: Arc<Mutex<IndexLog>>,
    fail_query: bool,
}

impl VectorIndex for RecordingIndex {
    fn add<'a>(&'a mut self, text: &'a str) -> IndexFuture<'a, ()> {
        self.docs.push(text.to_string());
        let mut log = self.log.lock().unwrap();
        log.ingested.push(text.to_string());
        log.live_documents += 1;
        Box::pin(async { Ok(()) })
    }

    fn query<'a>(&'a self, text: &'a str, k: usize) -> IndexFuture<'a, Vec<String>> {
        self.log.lock().unwrap().queries.push(text.to_string());
        let result = if self.fail_query {
            Err(Error::Index("query failed".into()))
        } else {
            Ok(self.docs.iter().take(k).cloned().collect())
        };
        Box::pin(async move { result })
    }

    fn clear(&mut self) -> IndexFuture<'_, ()> {
        let mut log = self.log.lock().unwrap();
        log.cleared += 1;
        log.live_documents -= self.docs.len();
        self.docs.clear();
        Box::pin(async { Ok(()) })
    }

    fn len(&self) -> usize {
        self.docs.len()
    }
}

#[derive(Default)]
pub struct RecordingIndexProvider {
    pub log: Arc<Mutex<IndexLog>>,
    pub fail_query: bool,
}

impl RecordingIndexProvider {
    pub fn failing_queries() -> Self {
        Self {
            fail_query: true,
            ..Default::default()
        }
    }

    pub fn snapshot<T>(&self, f: impl FnOnce(&IndexLog) -> T) -> T {
        f(&self.log.lock().unwrap())
    }
}

impl IndexProvider for RecordingIndexProvider {
    fn create(&self) -> Box<dyn VectorIndex> {
        self.log.lock().unwrap().created += 1;
        Box::new(RecordingIndex {
            docs: Vec::new(),
            log: Arc::clone(&self.log),
            fail_query: self.fail_query,
        })
    }
}

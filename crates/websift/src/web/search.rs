//! Search engine adapters.
//!
//! A [`SearchEngine`] turns a query into ranked [`SearchHit`]s. Two
//! adapters ship: [`SearxngSearch`] for a self-hosted SearXNG instance and
//! [`BraveSearch`] for the Brave Web Search API.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::debug;

use super::urlencoded;
use crate::error::{Error, Result};

/// Default per-request timeout for search calls.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

pub type SearchFuture<'a> = BoxFuture<'a, Result<Vec<SearchHit>>>;

/// Ranked web search.
pub trait SearchEngine: Send + Sync {
    /// Up to `max_results` hits, best first.
    fn search<'a>(&'a self, query: &'a str, max_results: usize) -> SearchFuture<'a>;

    /// Short engine name for log lines.
    fn name(&self) -> &str;
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("websift/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

async fn get_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
    let resp = request.header("Accept", "application/json").send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }
    let text = resp.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Pull hits out of a JSON results array. `snippet_key` differs per engine.
fn collect_hits(results: &serde_json::Value, snippet_key: &str, max: usize) -> Vec<SearchHit> {
    let Some(results) = results.as_array() else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|r| {
            let url = r["url"].as_str().map(str::trim).unwrap_or("");
            if url.is_empty() {
                return None;
            }
            Some(SearchHit {
                url: url.to_string(),
                title: r["title"].as_str().unwrap_or("").trim().to_string(),
                snippet: r[snippet_key].as_str().unwrap_or("").trim().to_string(),
            })
        })
        .take(max)
        .collect()
}

// ── SearXNG ────────────────────────────────────────────────────────

/// SearXNG JSON API (`GET {base}/search?q=…&format=json`).
///
/// The instance must have the `json` output format enabled.
pub struct SearxngSearch {
    client: reqwest::Client,
    base_url: String,
}

impl SearxngSearch {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_client(timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SearchEngine for SearxngSearch {
    fn search<'a>(&'a self, query: &'a str, max_results: usize) -> SearchFuture<'a> {
        Box::pin(async move {
            let url = format!(
                "{}/search?q={}&format=json",
                self.base_url,
                urlencoded(query)
            );
            debug!("searxng: {url}");
            let body = get_json(self.client.get(&url)).await?;
            Ok(collect_hits(&body["results"], "content", max_results))
        })
    }

    fn name(&self) -> &str {
        "searxng"
    }
}

// ── Brave ──────────────────────────────────────────────────────────

/// Brave Web Search API. Needs a subscription token
/// (free tier at <https://brave.com/search/api/>).
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            endpoint: BRAVE_SEARCH_URL.to_string(),
        })
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SearchEngine for BraveSearch {
    fn search<'a>(&'a self, query: &'a str, max_results: usize) -> SearchFuture<'a> {
        Box::pin(async move {
            // Brave caps count at 20.
            let count = max_results.clamp(1, 20);
            let url = format!("{}?q={}&count={count}", self.endpoint, urlencoded(query));
            debug!("brave: {url}");
            let body = get_json(
                self.client
                    .get(&url)
                    .header("X-Subscription-Token", &self.api_key),
            )
            .await?;
            Ok(collect_hits(
                &body["web"]["results"],
                "description",
                max_results,
            ))
        })
    }

    fn name(&self) -> &str {
        "brave"
    }
}

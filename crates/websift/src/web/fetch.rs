//! Page fetching and HTML-to-text extraction.

use std::time::Duration;

use futures::future::BoxFuture;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::compact_ws;
use crate::error::{Error, Result};

/// Default per-request timeout for page fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) websift/0.1";

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub type FetchFuture<'a> = BoxFuture<'a, Result<String>>;

/// Fetches a URL and returns its readable plain text.
pub trait WebFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// `reqwest`-backed fetcher with HTML extraction via `scraper`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl WebFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let resp = self
                .client
                .get(url)
                .header("Accept", "text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5")
                .send()
                .await?;
            let status = resp.status();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Http {
                    status: status.as_u16(),
                    body: compact_ws(&body),
                });
            }

            let is_html = match content_type.as_deref() {
                Some(ct) => match classify(ct) {
                    Some(PageKind::Html) => Some(true),
                    Some(PageKind::Text) => Some(false),
                    None => {
                        return Err(Error::Parse(format!("unsupported content type '{ct}'")));
                    }
                },
                None => None,
            };
            let body = resp.text().await?;

            // No content type: sniff.
            let is_html = is_html.unwrap_or_else(|| body.trim_start().starts_with('<'));
            let text = if is_html {
                html_to_text(&body)
            } else {
                compact_ws(&body)
            };
            debug!("fetched {url}: {} bytes -> {} chars", body.len(), text.len());
            Ok(text)
        })
    }
}

enum PageKind {
    Html,
    Text,
}

/// Whether a `Content-Type` carries readable text. `None` for binary types
/// (PDF, images, archives, octet streams).
fn classify(content_type: &str) -> Option<PageKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if essence.contains("html") {
        Some(PageKind::Html)
    } else if essence.starts_with("text/") || essence.contains("xml") || essence.contains("json") {
        Some(PageKind::Text)
    } else {
        None
    }
}

/// Readable text of an HTML document: the `<title>` followed by the body
/// text, skipping scripts, styles and templates.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(text_content))
        .map(|t| compact_ws(&t))
        .filter(|t| !t.is_empty());

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|root| {
            let mut out = String::new();
            visible_text(root, &mut out);
            compact_ws(&out)
        })
        .unwrap_or_default();

    match title {
        Some(title) if body.is_empty() => title,
        Some(title) => format!("{title}\n{body}"),
        None => body,
    }
}

fn text_content(elem: ElementRef<'_>) -> String {
    elem.text().collect::<Vec<_>>().join(" ")
}

fn visible_text(elem: ElementRef<'_>, out: &mut String) {
    for child in elem.children() {
        if let Some(child_elem) = ElementRef::wrap(child) {
            if SKIPPED_ELEMENTS.contains(&child_elem.value().name()) {
                continue;
            }
            visible_text(child_elem, out);
        } else if let Some(text) = child.value().as_text() {
            out.push(' ');
            out.push_str(text);
        }
    }
}

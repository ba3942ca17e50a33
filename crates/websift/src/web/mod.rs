//! Web collaborators: search engines and the page fetcher.
//!
//! Both sit behind object-safe traits ([`SearchEngine`], [`WebFetcher`]) so
//! the retrieval pipeline can be driven by fakes in tests. The concrete
//! adapters talk HTTP through `reqwest`.

pub mod fetch;
pub mod search;

pub use fetch::{FetchFuture, HttpFetcher, WebFetcher, html_to_text};
pub use search::{BraveSearch, SearchEngine, SearchFuture, SearchHit, SearxngSearch};

/// Minimal percent-encoding for URL query parameters.
pub(crate) fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push_str(&format!("{b:02X}"));
            }
        }
    }
    out
}

/// Collapse every whitespace run to a single space.
pub(crate) fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Evidence items and the question they answer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key for the originating URL(s).
pub const SOURCE: &str = "source";
/// Metadata key for the search hit title.
pub const TITLE: &str = "title";

/// The user's question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Ordered string → string metadata attached to an item.
///
/// Additive only: nothing in the pipeline removes a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: impl Into<String>) -> Self {
        let mut meta = Self::new();
        meta.insert(SOURCE, source);
        meta
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Metadata for an item built from several inputs. `source` and
    /// `title` become every input's non-blank value, comma-joined in input
    /// order; any other key is kept only when all inputs agree on it.
    pub fn combined<'a>(inputs: impl IntoIterator<Item = &'a Metadata>) -> Metadata {
        let inputs: Vec<&Metadata> = inputs.into_iter().collect();
        let Some(first) = inputs.first() else {
            return Metadata::new();
        };

        let mut merged = Metadata::new();
        for (key, value) in first.iter() {
            if key != SOURCE && key != TITLE && inputs.iter().all(|m| m.get(key) == Some(value)) {
                merged.insert(key, value);
            }
        }
        for key in [SOURCE, TITLE] {
            let values: Vec<&str> = inputs
                .iter()
                .filter_map(|m| m.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if !values.is_empty() {
                merged.insert(key, values.join(","));
            }
        }
        merged
    }
}

/// One piece of evidence: text plus where it came from.
///
/// Items are replaced, never edited: every stage that changes the text
/// builds a new item with [`with_text`](Self::with_text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub text: String,
    pub metadata: Metadata,
}

impl ContentItem {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// A new item with `text` and a copy of this item's metadata.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.source()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_transparent_in_json() {
        let q = Query::new("what is rust?");
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"what is rust?\"");
        assert_eq!(q.to_string(), "what is rust?");
    }

    #[test]
    fn with_text_keeps_metadata() {
        let mut meta = Metadata::with_source("https://a.example");
        meta.insert(TITLE, "A");
        let item = ContentItem::new("long text", meta.clone());
        let shorter = item.with_text("short");
        assert_eq!(shorter.text, "short");
        assert_eq!(shorter.metadata, meta);
        assert_eq!(item.text, "long text");
    }

    #[test]
    fn blank_detection() {
        assert!(ContentItem::new("  \n\t", Metadata::new()).is_blank());
        assert!(!ContentItem::new(" x ", Metadata::new()).is_blank());
    }

    #[test]
    fn combined_joins_sources_skipping_blanks() {
        let mut first = Metadata::with_source("https://a.example");
        first.insert(TITLE, "First");
        let second = Metadata::with_source("  ");
        let third = Metadata::with_source("https://c.example");
        let merged = Metadata::combined([&first, &second, &third]);
        assert_eq!(merged.source(), Some("https://a.example,https://c.example"));
        assert_eq!(merged.get(TITLE), Some("First"));
    }

    #[test]
    fn combined_titles_follow_their_sources() {
        let mut a = Metadata::with_source("https://a.example");
        a.insert(TITLE, "Alpha");
        a.insert("lang", "en");
        let mut b = Metadata::with_source("https://b.example");
        b.insert(TITLE, "Beta");
        b.insert("lang", "en");
        let mut c = Metadata::with_source("https://c.example");
        c.insert(TITLE, "Gamma");
        c.insert("lang", "fr");

        let merged = Metadata::combined([&a, &b]);
        assert_eq!(merged.source(), Some("https://a.example,https://b.example"));
        assert_eq!(merged.get(TITLE), Some("Alpha,Beta"));
        assert_eq!(merged.get("lang"), Some("en"));

        // Disagreeing keys are dropped.
        let merged = Metadata::combined([&a, &b, &c]);
        assert_eq!(merged.get(TITLE), Some("Alpha,Beta,Gamma"));
        assert_eq!(merged.get("lang"), None);
    }

    #[test]
    fn combined_of_nothing_is_empty() {
        assert!(Metadata::combined(std::iter::empty()).is_empty());
    }

    #[test]
    fn item_serializes_flat_metadata() {
        let item = ContentItem::new("t", Metadata::with_source("u"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["text"], "t");
        assert_eq!(json["metadata"]["source"], "u");
    }
}

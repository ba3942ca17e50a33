//! Semantic compression of oversized items.
//!
//! Instead of truncating, an oversized item is broken into sentence groups
//! that go into a fresh vector index. Querying that index with the question
//! keeps only the groups most similar to it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::context::{ContentItem, Query, TokenBudget, Tokenizer};
use crate::error::with_timeout;
use crate::index::IndexProvider;

/// Sentences this short or shorter (in chars) are dropped before grouping.
pub const DEFAULT_MIN_SENTENCE_CHARS: usize = 10;
/// Sentences per indexed document.
pub const DEFAULT_GROUP_SIZE: usize = 15;
/// Documents retrieved per compression.
pub const DEFAULT_TOP_K: usize = 3;
/// Deadline for ingest plus query.
pub const DEFAULT_INDEX_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BudgetCompressor {
    index_provider: Arc<dyn IndexProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    budget: TokenBudget,
    min_sentence_chars: usize,
    group_size: usize,
    top_k: usize,
    timeout: Duration,
}

impl BudgetCompressor {
    pub fn new(index_provider: Arc<dyn IndexProvider>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            index_provider,
            tokenizer,
            budget: TokenBudget::default(),
            min_sentence_chars: DEFAULT_MIN_SENTENCE_CHARS,
            group_size: DEFAULT_GROUP_SIZE,
            top_k: DEFAULT_TOP_K,
            timeout: DEFAULT_INDEX_TIMEOUT,
        }
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_min_sentence_chars(mut self, chars: usize) -> Self {
        self.min_sentence_chars = chars;
        self
    }

    /// Zero is treated as one.
    pub fn with_group_size(mut self, size: usize) -> Self {
        self.group_size = size.max(1);
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn needs_compression(&self, item: &ContentItem) -> bool {
        self.budget.exceeds_item(self.tokenizer.estimate(&item.text))
    }

    /// Compress `item` if it is over the per-item ceiling.
    ///
    /// Items within the ceiling come back unchanged. `None` means nothing
    /// survived (no usable sentences, index failure, or timeout).
    pub async fn compress(&self, query: &Query, item: &ContentItem) -> Option<ContentItem> {
        if !self.needs_compression(item) {
            return Some(item.clone());
        }

        let groups = self.sentence_groups(&item.text);
        if groups.is_empty() {
            debug!(
                "{}: no sentences longer than {} chars",
                item.source().unwrap_or("<unknown>"),
                self.min_sentence_chars
            );
            return None;
        }

        let mut index = self.index_provider.create();
        let outcome = with_timeout(self.timeout, async {
            index.add_all(&groups).await?;
            index.query(query.text(), self.top_k).await
        })
        .await;
        // Clear on every path, including failures and timeouts.
        if let Err(e) = index.clear().await {
            warn!("failed to clear vector index: {e}");
        }
        drop(index);

        let matches = match outcome {
            Ok(matches) => matches,
            Err(e) => {
                warn!(
                    "compression of {} failed: {e}",
                    item.source().unwrap_or("<unknown>")
                );
                return None;
            }
        };

        let text = matches.join(" ");
        if text.trim().is_empty() {
            return None;
        }
        debug!(
            "compressed {}: {} groups -> {} matches, ~{} -> ~{} tokens",
            item.source().unwrap_or("<unknown>"),
            groups.len(),
            matches.len(),
            self.tokenizer.estimate(&item.text),
            self.tokenizer.estimate(&text),
        );
        Some(item.with_text(text))
    }

    /// Kept sentences, `group_size` at a time, each group space-joined.
    fn sentence_groups(&self, text: &str) -> Vec<String> {
        let kept: Vec<&str> = split_sentences(text)
            .filter(|s| s.chars().count() > self.min_sentence_chars)
            .collect();
        kept.chunks(self.group_size).map(|group| group.join(" ")).collect()
    }
}

/// Split after every `.`, `!` or `?`. Whitespace around sentences is
/// dropped; a trailing fragment without a terminator is a sentence too.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

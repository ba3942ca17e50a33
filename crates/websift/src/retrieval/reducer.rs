//! Aggregate reduction: split, pack into batches, re-filter.
//!
//! Only runs when the filtered evidence set is still over the aggregate
//! ceiling. Items bigger than the ceiling are split on whitespace, every
//! item is packed first-fit into batches that fit the ceiling, and each
//! batch goes back through the relevance filter as one unit.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::collector::DEFAULT_CONCURRENCY;
use super::relevance::RelevanceStage;
use crate::context::{ContentItem, Query, TokenBudget, Tokenizer};

/// Longest run of chars a single token is assumed to cover when cutting a
/// word with no whitespace.
const MAX_CHARS_PER_TOKEN: usize = 8;

/// Items whose summed estimate fits the aggregate ceiling.
pub type Batch = Vec<ContentItem>;

pub struct AggregateReducer {
    relevance: RelevanceStage,
    tokenizer: Arc<dyn Tokenizer>,
    budget: TokenBudget,
    concurrency: usize,
}

impl AggregateReducer {
    pub fn new(relevance: RelevanceStage, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            relevance,
            tokenizer,
            budget: TokenBudget::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Split, pack and re-filter `items`. Batches are filtered concurrently;
    /// the output follows batch order.
    pub async fn reduce(&self, query: &Query, items: Vec<ContentItem>) -> Vec<ContentItem> {
        let parts: Vec<ContentItem> = items.iter().flat_map(|item| self.split(item)).collect();
        let batches = self.pack(parts);
        info!(
            "reducing {} item(s) into {} batch(es) of at most {} tokens",
            items.len(),
            batches.len(),
            self.budget.aggregate_max
        );

        stream::iter(batches)
            .map(move |batch| async move { self.relevance.filter(query, &batch).await })
            .buffered(self.concurrency)
            .filter_map(future::ready)
            .filter(|item| future::ready(!item.is_blank()))
            .collect()
            .await
    }

    /// Break an item over the aggregate ceiling into parts that each fit.
    /// Items within the ceiling come back as-is.
    pub fn split(&self, item: &ContentItem) -> Vec<ContentItem> {
        let max = self.budget.aggregate_max;
        if self.tokenizer.estimate(&item.text) <= max {
            return vec![item.clone()];
        }

        let mut parts: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;
        for word in item.text.split_whitespace() {
            let tokens = self.tokenizer.estimate(word);
            if tokens > max {
                flush(&mut current, &mut parts);
                current_tokens = 0;
                parts.extend(self.hard_split(word));
                continue;
            }
            if current_tokens + tokens > max {
                flush(&mut current, &mut parts);
                current_tokens = 0;
            }
            current.push(word);
            current_tokens += tokens;
        }
        flush(&mut current, &mut parts);

        // Per-word sums can undercount the joined text; re-split anything
        // that still estimates over the ceiling.
        let parts: Vec<String> = parts.into_iter().flat_map(|p| self.fit(p)).collect();
        debug!(
            "split {} into {} part(s)",
            item.source().unwrap_or("<unknown>"),
            parts.len()
        );
        parts.into_iter().map(|p| item.with_text(p)).collect()
    }

    fn fit(&self, part: String) -> Vec<String> {
        if self.tokenizer.estimate(&part) <= self.budget.aggregate_max {
            return vec![part];
        }
        let words: Vec<&str> = part.split_whitespace().collect();
        if words.len() <= 1 {
            return self.hard_split(&part);
        }
        let (left, right) = words.split_at(words.len() / 2);
        let mut out = self.fit(left.join(" "));
        out.extend(self.fit(right.join(" ")));
        out
    }

    /// Cut one oversized word on char boundaries into the longest prefixes
    /// that fit. Every chunk has at least one char.
    fn hard_split(&self, word: &str) -> Vec<String> {
        let max = self.budget.aggregate_max;
        // Probes never look further ahead than this many chars.
        let window = max.saturating_mul(MAX_CHARS_PER_TOKEN).max(1);
        let chars: Vec<char> = word.chars().collect();
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let remaining = chars.len() - start;
            // Largest n in 1..=hi with estimate(prefix of n) <= max.
            let (mut lo, mut hi) = (1, remaining.min(window));
            while lo < hi {
                let mid = lo + (hi - lo).div_ceil(2);
                let candidate: String = chars[start..start + mid].iter().collect();
                if self.tokenizer.estimate(&candidate) <= max {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }
            out.push(chars[start..start + lo].iter().collect());
            start += lo;
        }
        out
    }

    /// First-fit in input order: a batch closes when the next item would
    /// push it over the ceiling. No empty batches.
    pub fn pack(&self, items: Vec<ContentItem>) -> Vec<Batch> {
        let mut batches = Vec::new();
        let mut current: Batch = Vec::new();
        let mut current_tokens = 0;
        for item in items {
            let tokens = self.tokenizer.estimate(&item.text);
            if !current.is_empty() && current_tokens + tokens > self.budget.aggregate_max {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(item);
            current_tokens += tokens;
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

fn flush(current: &mut Vec<&str>, parts: &mut Vec<String>) {
    if !current.is_empty() {
        parts.push(current.join(" "));
        current.clear();
    }
}

//! The evidence pipeline.
//!
//! ```text
//! EvidenceCollector ─▶ BudgetCompressor ─▶ RelevanceStage ─▶ AggregateReducer
//!   search + fetch      (> item_max)        per item          (> aggregate_max)
//! ```
//!
//! [`Retriever`] chains the stages. Each stage is usable on its own, which
//! is how the tests exercise them.
//!
//! Failure policy: a failed search gives no evidence, a failed fetch keeps
//! the snippet, a failed compression or filter drops the item, and a
//! panicking stage yields nothing. None of it reaches the caller as an
//! error.

pub mod collector;
pub mod compressor;
pub mod pipeline;
pub mod reducer;
pub mod relevance;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::EvidenceCollector;
pub use compressor::{BudgetCompressor, split_sentences};
pub use pipeline::{Collaborators, EvidenceFuture, EvidenceSource, Retriever};
pub use reducer::{AggregateReducer, Batch};
pub use relevance::{
    FilterFuture, FilterRelevance, FilterResponse, LlmRelevanceFilter, RelevanceStage,
};

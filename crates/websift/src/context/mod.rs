//! Evidence items and token accounting.
//!
//! - **[`item`]**: [`Query`], [`Metadata`] and [`ContentItem`], the values
//!   that flow through the retrieval pipeline.
//! - **[`budget`]**: the [`Tokenizer`] trait, the default
//!   [`CharRatioTokenizer`], and the [`TokenBudget`] ceilings.

pub mod budget;
pub mod item;

pub use budget::{BudgetUsage, CharRatioTokenizer, TokenBudget, Tokenizer};
pub use item::{ContentItem, Metadata, Query};

//! Model-callable tools.
//!
//! - **[`core`]**: the [`Tool`] trait and the [`ToolSet`] dispatcher.
//! - **[`web_search`]**: [`WebSearchTool`], backed by any
//!   [`EvidenceSource`](crate::retrieval::EvidenceSource).

pub mod core;
pub mod web_search;

pub use self::core::{
    DEFAULT_MAX_RESULT_BYTES, DEFAULT_TOOL_TIMEOUT, Tool, ToolFuture, ToolSet, parse_tool_args,
    truncate_result,
};
pub use web_search::{WEB_SEARCH_TOOL, WebSearchArgs, WebSearchTool};

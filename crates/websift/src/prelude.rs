//! Convenience re-exports for common `websift` types.
//!
//! ```ignore
//! use websift::prelude::*;
//! ```
//!
//! Covers building a retriever from settings, running it, and answering
//! questions. Stage types and adapters are left out; import those from
//! their modules when composing a custom pipeline.

pub use crate::{ChatClient, Error, Result};

pub use crate::agent::{GenerateAnswer, RetrievalAssistant, ToolAssistant};
pub use crate::config::{AssistantMode, PipelineConfig, SearchBackend, Settings};
pub use crate::context::{ContentItem, Metadata, Query, TokenBudget, Tokenizer};
pub use crate::retrieval::{Collaborators, EvidenceSource, Retriever};

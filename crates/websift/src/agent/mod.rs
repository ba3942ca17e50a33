//! Answer generation: prompts and assistants.
//!
//! - **[`prompt`]**: the fixed system prompts and the evidence injection
//!   format.
//! - **[`assistant`]**: the [`GenerateAnswer`] trait with the
//!   [`RetrievalAssistant`] and [`ToolAssistant`] strategies.

pub mod assistant;
pub mod prompt;

pub use assistant::{
    AnswerFuture, DEFAULT_MAX_ROUNDS, GenerateAnswer, RetrievalAssistant, ToolAssistant,
};

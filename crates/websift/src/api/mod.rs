//! API interaction support shared by the collaborator adapters.
//!
//! - [`retry`]: transient error detection with configurable exponential
//!   backoff. Only the chat client consults it; the default is no retries.
//! - [`tracing`]: correlation IDs (`trace_id`) for retrieval runs and
//!   [`init_logging`] for binaries.

pub mod retry;
pub mod tracing;

pub use retry::RetryConfig;
pub use self::tracing::{generate_trace_id, init_logging};

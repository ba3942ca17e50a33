//! Token accounting for evidence sets.
//!
//! Every size decision in the retrieval pipeline goes through a
//! [`Tokenizer`]. Nothing here calls a model tokenizer; the default
//! [`CharRatioTokenizer`] estimates from character counts, which is close
//! enough for budgeting and costs nothing.

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Default ceiling for the whole evidence set handed to the model.
pub const DEFAULT_AGGREGATE_MAX: usize = 8000;

/// Default ceiling for a single item before it gets compressed.
pub const DEFAULT_ITEM_MAX: usize = 1000;

/// Estimates the token count of a text span.
///
/// Implementations must be total and deterministic: the same text always
/// yields the same count, and no input is an error.
pub trait Tokenizer: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// `ceil(chars / chars_per_token)`.
#[derive(Debug, Clone, Copy)]
pub struct CharRatioTokenizer {
    chars_per_token: f64,
}

impl Default for CharRatioTokenizer {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl CharRatioTokenizer {
    /// Use a calibrated ratio. Non-positive ratios fall back to the default.
    pub fn with_ratio(chars_per_token: f64) -> Self {
        if chars_per_token > 0.0 && chars_per_token.is_finite() {
            Self { chars_per_token }
        } else {
            Self::default()
        }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Tokenizer for CharRatioTokenizer {
    fn estimate(&self, text: &str) -> usize {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        (chars as f64 / self.chars_per_token).ceil() as usize
    }
}

/// Per-item and aggregate token ceilings for one retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Ceiling for the summed evidence set (and for any single item after
    /// reduction).
    pub aggregate_max: usize,
    /// Items estimated above this are compressed before filtering.
    pub item_max: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            aggregate_max: DEFAULT_AGGREGATE_MAX,
            item_max: DEFAULT_ITEM_MAX,
        }
    }
}

impl TokenBudget {
    pub fn new(aggregate_max: usize, item_max: usize) -> Self {
        Self {
            aggregate_max,
            item_max,
        }
    }

    /// Snapshot of how much of the aggregate ceiling `total` consumes.
    pub fn usage(&self, total: usize) -> BudgetUsage {
        let usage_pct = if self.aggregate_max == 0 {
            1.0
        } else {
            total as f64 / self.aggregate_max as f64
        };
        BudgetUsage {
            estimated_tokens: total,
            max_tokens: self.aggregate_max,
            usage_pct,
        }
    }

    pub fn exceeds_item(&self, tokens: usize) -> bool {
        tokens > self.item_max
    }

    pub fn exceeds_aggregate(&self, tokens: usize) -> bool {
        tokens > self.aggregate_max
    }
}

/// Budget usage for a finished evidence set.
#[derive(Debug, Clone)]
pub struct BudgetUsage {
    pub estimated_tokens: usize,
    pub max_tokens: usize,
    pub usage_pct: f64,
}

impl BudgetUsage {
    /// Format as a compact log string.
    pub fn to_log_string(&self) -> String {
        format!(
            "evidence: ~{} tokens ({:.0}% of {})",
            self.estimated_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }

    pub fn over_budget(&self) -> bool {
        self.estimated_tokens > self.max_tokens
    }
}

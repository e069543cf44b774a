//! Error taxonomy for the generation loop with failure classification.
//!
//! Every error the loop can surface is represented here. Callers can query
//! `is_retriable()` / `category()` without string matching; the loop itself
//! never retries.
//!
//! ## Categories
//!
//! | Category      | Retriable | Raised by                               |
//! |---------------|-----------|-----------------------------------------|
//! | Transient     | yes       | external model call                     |
//! | Schema        | no        | response parsing                        |
//! | Budget        | no        | overrun check (`fail` policy)           |
//! | Exhausted     | no        | iteration guard                         |
//! | Invalid       | no        | entry point / configuration validation  |
//! | Internal      | no        | state machine guard                     |

use std::fmt;

use thiserror::Error;

use crate::state_machine::IllegalTransition;

/// Classification used by callers to decide whether to wrap the loop in a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Network / provider / auth failure of the model call.
    Transient,
    /// The model replied with something that is not a `ContinuationResult`.
    Schema,
    /// A continuation overshot the remaining word budget.
    Budget,
    /// The iteration guard tripped before the script completed.
    Exhausted,
    /// Bad caller input or configuration.
    Invalid,
    /// Broken loop invariant.
    Internal,
}

impl FailureCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Schema => write!(f, "schema"),
            Self::Budget => write!(f, "budget"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Invalid => write!(f, "invalid"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type for script generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The model request failed (transport, auth, provider error).
    #[error("External model call failed: {0}")]
    ExternalCall(String),

    /// The model response does not match the three-field continuation schema.
    #[error("Schema validation failed: {reason}")]
    SchemaValidation { reason: String, raw: String },

    /// A continuation would push the script past its word budget.
    #[error(
        "Budget overrun: step produced {attempted} words with {remaining} remaining \
         ({word_count}/{max_words} used)"
    )]
    BudgetOverrun {
        word_count: u32,
        max_words: u32,
        remaining: u32,
        attempted: u32,
    },

    /// The iteration guard tripped before the model signalled completion.
    #[error("Max iterations ({iterations}) reached at {word_count}/{max_words} words")]
    MaxIterations {
        iterations: u32,
        word_count: u32,
        max_words: u32,
    },

    /// Consecutive steps added no words.
    #[error("Generation stalled: {steps} steps in a row added no words at {word_count}/{max_words}")]
    Stalled {
        steps: u32,
        word_count: u32,
        max_words: u32,
    },

    /// The caller supplied an unusable topic or word budget.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration is invalid or missing required fields.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

impl GenerationError {
    /// Classify this error.
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::ExternalCall(_) => FailureCategory::Transient,
            Self::SchemaValidation { .. } => FailureCategory::Schema,
            Self::BudgetOverrun { .. } => FailureCategory::Budget,
            Self::MaxIterations { .. } | Self::Stalled { .. } => FailureCategory::Exhausted,
            Self::InvalidRequest(_) | Self::Configuration(_) => FailureCategory::Invalid,
            Self::IllegalTransition(_) => FailureCategory::Internal,
        }
    }

    /// Returns `true` if an outer caller may reasonably retry the whole run.
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Build a `SchemaValidation` variant conveniently.
    pub fn schema(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::SchemaValidation {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

//! `GenerationState`: the single value threaded through the generation loop.

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Smallest accepted word budget.
pub const MIN_MAX_WORDS: u32 = 10;
/// Largest accepted word budget.
pub const MAX_MAX_WORDS: u32 = 40_000;

/// Appended after every continuation and summary fragment.
pub const FRAGMENT_SEPARATOR: &str = " ";

/// Accumulated script state.
///
/// Only the crate folds new fragments into a state; callers construct the
/// initial value and read the final one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    topic: String,
    max_words: u32,
    word_count: u32,
    words_remaining: i64,
    script: String,
    summary: String,
    completed: bool,
}

impl GenerationState {
    /// Initial state for a run. Rejects an empty topic or an out-of-range budget.
    pub fn new(topic: impl Into<String>, max_words: u32) -> Result<Self, GenerationError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "topic must not be empty".to_string(),
            ));
        }
        if !(MIN_MAX_WORDS..=MAX_MAX_WORDS).contains(&max_words) {
            return Err(GenerationError::InvalidRequest(format!(
                "max_words must be in [{MIN_MAX_WORDS}, {MAX_MAX_WORDS}], got {max_words}"
            )));
        }

        Ok(Self {
            topic,
            max_words,
            word_count: 0,
            words_remaining: i64::from(max_words),
            script: String::new(),
            summary: String::new(),
            completed: false,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn max_words(&self) -> u32 {
        self.max_words
    }

    pub fn word_count(&self) -> u32 {
        self.word_count
    }

    /// `max_words - word_count`. Negative only if a fold overshot the budget.
    pub fn words_remaining(&self) -> i64 {
        self.words_remaining
    }

    /// Words that may still be written, clamped at zero.
    pub fn budget_left(&self) -> u32 {
        u32::try_from(self.words_remaining.max(0)).unwrap_or(0)
    }

    /// The script as accumulated, separators included.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Fold one step's output into the next state.
    pub(crate) fn fold(
        mut self,
        continuation: &str,
        continuation_summary: &str,
        new_words: u32,
        completed: bool,
    ) -> Self {
        self.word_count = self.word_count.saturating_add(new_words);
        self.words_remaining = i64::from(self.max_words) - i64::from(self.word_count);
        self.script.push_str(continuation);
        self.script.push_str(FRAGMENT_SEPARATOR);
        self.summary.push_str(continuation_summary);
        self.summary.push_str(FRAGMENT_SEPARATOR);
        self.completed = completed;
        self
    }
}

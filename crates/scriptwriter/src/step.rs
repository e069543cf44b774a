//! The continuation step: one model call turned into a validated increment.

use tracing::debug;

use crate::contracts::{parse_continuation, ContinuationResult};
use crate::errors::GenerationError;
use crate::model::{ContinuationRequest, ScriptModel};
use crate::prompts;
use crate::state::GenerationState;
use crate::words::count_words;

/// A validated step response plus the locally computed word count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub result: ContinuationResult,
    /// Whitespace-token count of `result.continuation`. Authoritative.
    pub new_words: u32,
}

/// Builds the request, calls the model once, validates the reply.
///
/// Termination is not decided here; `completed` is passed through untouched.
pub struct ContinuationStep<M> {
    model: M,
    preamble: String,
}

impl<M: ScriptModel> ContinuationStep<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            preamble: prompts::system_preamble(),
        }
    }

    /// Render the request for `state` without sending it.
    pub fn request_for(&self, state: &GenerationState) -> ContinuationRequest {
        ContinuationRequest {
            preamble: self.preamble.clone(),
            prompt: prompts::continuation_prompt(state),
            words_remaining: state.words_remaining(),
        }
    }

    pub async fn run(&self, state: &GenerationState) -> Result<StepOutput, GenerationError> {
        let request = self.request_for(state);
        let raw = self.model.complete(&request).await?;
        let result = parse_continuation(&raw)?;
        let new_words = count_words(&result.continuation);

        debug!(
            new_words,
            reported_completed = result.completed,
            words_remaining = request.words_remaining,
            "continuation received"
        );

        Ok(StepOutput { result, new_words })
    }
}

//! Generation loop: drives `ContinuationStep` until the script is complete.
//!
//! ```text
//! ScriptGenerator::generate(topic, max_words)
//!   → loop:
//!       iteration guard            — Failed + MaxIterations
//!       step.run(state)            — one model call
//!       overrun check              — truncate, or Failed + BudgetOverrun
//!       stall check                — Failed + Stalled
//!       fold into next state
//!       completed? → Done          — model flag, local budget check, or overrun
//!   → GenerationOutcome
//! ```
//!
//! Steps are strictly sequential: each request is rendered from the state the
//! previous step produced.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{GenerationConfig, OverrunPolicy};
use crate::errors::GenerationError;
use crate::model::ScriptModel;
use crate::state::GenerationState;
use crate::state_machine::{GenerationPhase, StateMachine, TransitionRecord};
use crate::step::{ContinuationStep, StepOutput};
use crate::words::truncate_to_words;

/// Why a run reached `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model returned `completed = true`.
    ModelSignalled,
    /// `words_remaining` fell to the completion threshold.
    BudgetExhausted,
    /// The last continuation was cut to fit the budget.
    OverrunTruncated,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelSignalled => write!(f, "model signalled completion"),
            Self::BudgetExhausted => write!(f, "word budget exhausted"),
            Self::OverrunTruncated => write!(f, "continuation truncated to fit budget"),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub state: GenerationState,
    pub iterations: u32,
    pub reason: TerminationReason,
    /// Words dropped from the final continuation by truncation.
    pub truncated_words: u32,
    pub transitions: Vec<TransitionRecord>,
}

impl GenerationOutcome {
    /// Script text without the trailing separator.
    pub fn script(&self) -> &str {
        self.state.script().trim_end()
    }

    pub fn summary(&self) -> &str {
        self.state.summary().trim_end()
    }

    pub fn word_count(&self) -> u32 {
        self.state.word_count()
    }
}

/// Continuation text and word count after the overrun check.
struct Accepted {
    continuation: String,
    new_words: u32,
    dropped: u32,
}

/// Owns the continuation step and the loop policy.
pub struct ScriptGenerator<M> {
    step: ContinuationStep<M>,
    config: GenerationConfig,
}

impl<M: ScriptModel> ScriptGenerator<M> {
    pub fn new(model: M, config: GenerationConfig) -> Self {
        Self {
            step: ContinuationStep::new(model),
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a script for `topic` within `max_words`.
    pub async fn generate(
        &self,
        topic: &str,
        max_words: u32,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.config
            .validate()
            .map_err(GenerationError::Configuration)?;
        let state = GenerationState::new(topic, max_words)?;
        if self.config.completion_threshold >= max_words {
            return Err(GenerationError::InvalidRequest(format!(
                "completion_threshold ({}) must be below max_words ({max_words})",
                self.config.completion_threshold
            )));
        }
        self.run(state).await
    }

    async fn run(&self, initial: GenerationState) -> Result<GenerationOutcome, GenerationError> {
        let mut sm = StateMachine::new();
        let mut state = initial;
        let mut iterations: u32 = 0;
        let mut stalled: u32 = 0;
        let limit = self.config.iteration_limit(state.max_words());

        info!(
            topic = %state.topic(),
            max_words = state.max_words(),
            max_iterations = limit,
            policy = %self.config.overrun_policy,
            prompt_version = crate::prompts::PROMPT_VERSION,
            "generation starting"
        );

        loop {
            if iterations >= limit {
                warn!(iterations, word_count = state.word_count(), "max iterations reached");
                sm.fail("max iterations reached")?;
                return Err(GenerationError::MaxIterations {
                    iterations,
                    word_count: state.word_count(),
                    max_words: state.max_words(),
                });
            }

            iterations += 1;
            sm.set_iteration(iterations);

            let output = match self.step.run(&state).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(iterations, error = %e, "continuation step failed");
                    sm.fail(&e.to_string())?;
                    return Err(e);
                }
            };

            let completed_flag = output.result.completed;
            let summary = output.result.continuation_summary.clone();
            let accepted = match self.accept(&state, output) {
                Ok(accepted) => accepted,
                Err(e) => {
                    sm.fail(&e.to_string())?;
                    return Err(e);
                }
            };

            let remaining_after = state.words_remaining() - i64::from(accepted.new_words);
            let reason =
                self.termination_reason(remaining_after, completed_flag, accepted.dropped > 0);

            stalled = if accepted.new_words == 0 { stalled + 1 } else { 0 };
            let limit_hit =
                self.config.max_stalled_steps > 0 && stalled >= self.config.max_stalled_steps;
            if reason.is_none() && limit_hit {
                warn!(iterations, stalled, "no progress from model");
                sm.fail("no words added")?;
                return Err(GenerationError::Stalled {
                    steps: stalled,
                    word_count: state.word_count(),
                    max_words: state.max_words(),
                });
            }

            state = state.fold(
                &accepted.continuation,
                &summary,
                accepted.new_words,
                reason.is_some(),
            );

            info!(
                iterations,
                max_words = state.max_words(),
                word_count = state.word_count(),
                words_remaining = state.words_remaining(),
                completed = state.completed(),
                "Generating..."
            );

            match reason {
                Some(reason) => {
                    sm.advance(GenerationPhase::Done, Some(&reason.to_string()))?;
                    debug_assert!(sm.is_terminal());
                    info!(
                        iterations,
                        %reason,
                        phase = %sm.current(),
                        summary = %sm.summary(),
                        "Finished!"
                    );
                    return Ok(GenerationOutcome {
                        state,
                        iterations,
                        reason,
                        truncated_words: accepted.dropped,
                        transitions: sm.into_transitions(),
                    });
                }
                None => sm.advance(GenerationPhase::Running, None)?,
            }
        }
    }

    /// Apply the overrun policy to one step's output.
    fn accept(
        &self,
        state: &GenerationState,
        output: StepOutput,
    ) -> Result<Accepted, GenerationError> {
        let remaining = state.budget_left();
        if output.new_words <= remaining {
            return Ok(Accepted {
                continuation: output.result.continuation,
                new_words: output.new_words,
                dropped: 0,
            });
        }

        warn!(
            attempted = output.new_words,
            remaining,
            policy = %self.config.overrun_policy,
            "continuation overshoots word budget"
        );

        match self.config.overrun_policy {
            OverrunPolicy::Fail => Err(GenerationError::BudgetOverrun {
                word_count: state.word_count(),
                max_words: state.max_words(),
                remaining,
                attempted: output.new_words,
            }),
            OverrunPolicy::Truncate => Ok(Accepted {
                continuation: truncate_to_words(&output.result.continuation, remaining)
                    .to_string(),
                new_words: remaining,
                dropped: output.new_words - remaining,
            }),
        }
    }

    /// Overrun beats the model's flag, which beats the local budget check.
    fn termination_reason(
        &self,
        words_remaining: i64,
        completed_flag: bool,
        overrun: bool,
    ) -> Option<TerminationReason> {
        if overrun {
            Some(TerminationReason::OverrunTruncated)
        } else if completed_flag {
            Some(TerminationReason::ModelSignalled)
        } else if words_remaining <= i64::from(self.config.completion_threshold) {
            Some(TerminationReason::BudgetExhausted)
        } else {
            None
        }
    }
}

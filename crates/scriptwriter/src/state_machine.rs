//! Generation loop state machine: explicit phases and legal transition guards.
//!
//! The loop calls `advance()` once per folded step so that:
//! 1. Every phase change is logged and auditable.
//! 2. Illegal transitions (anything out of a terminal phase) are rejected.
//! 3. The transition log travels back to the caller with the final outcome.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Phases of a generation run.
///
/// Every run starts at `Running` and terminates at either `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    /// Requesting and folding continuations.
    Running,
    /// Script complete — terminal state.
    Done,
    /// Aborted by an error or a guard — terminal state.
    Failed,
}

impl GenerationPhase {
    /// Whether this is a terminal phase (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Legal transitions between phases.
///
/// ```text
/// Running → Running | Done | Failed
/// ```
fn is_legal_transition(from: GenerationPhase, to: GenerationPhase) -> bool {
    use GenerationPhase::*;

    matches!((from, to), (Running, Running) | (Running, Done) | (Running, Failed))
}

/// A single recorded transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: GenerationPhase,
    pub to: GenerationPhase,
    /// Iteration number at the time of transition.
    pub iteration: u32,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: GenerationPhase,
    pub to: GenerationPhase,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal phase transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Tracks the current phase and keeps a log of every transition.
pub struct StateMachine {
    current: GenerationPhase,
    iteration: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    /// Create a new state machine starting at `Running`.
    pub fn new() -> Self {
        Self {
            current: GenerationPhase::Running,
            iteration: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> GenerationPhase {
        self.current
    }

    /// Set the iteration counter (called by the generation loop).
    pub fn set_iteration(&mut self, iteration: u32) {
        self.iteration = iteration;
    }

    /// Attempt to advance to the next phase.
    pub fn advance(
        &mut self,
        to: GenerationPhase,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            iteration: self.iteration,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            iteration = self.iteration,
            "Phase transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    /// Transition to `Failed`. Always legal while running.
    pub fn fail(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(GenerationPhase::Failed, Some(reason))
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Consume the machine, returning its transition log.
    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    /// One-line summary of the run's history.
    pub fn summary(&self) -> String {
        format!(
            "{} → {} ({}ms, {} transitions, {} iterations)",
            GenerationPhase::Running,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
            self.iteration,
        )
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), GenerationPhase::Running);
        assert!(!sm.is_terminal());
        assert!(sm.into_transitions().is_empty());
    }

    #[test]
    fn test_running_loop_then_done() {
        let mut sm = StateMachine::new();
        sm.set_iteration(1);
        sm.advance(GenerationPhase::Running, Some("continue"))
            .unwrap();
        sm.set_iteration(2);
        sm.advance(GenerationPhase::Done, Some("model signalled completion"))
            .unwrap();

        assert!(sm.is_terminal());
        let log = sm.into_transitions();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].iteration, 2);
    }

    #[test]
    fn test_fail_from_running() {
        let mut sm = StateMachine::new();
        assert!(sm.fail("schema validation").is_ok());
        assert_eq!(sm.current(), GenerationPhase::Failed);
        assert_eq!(
            sm.into_transitions()[0].reason.as_deref(),
            Some("schema validation")
        );
    }

    #[test]
    fn test_cannot_leave_terminal_phase() {
        let mut sm = StateMachine::new();
        sm.advance(GenerationPhase::Done, None).unwrap();

        let err = sm.advance(GenerationPhase::Running, None).unwrap_err();
        assert_eq!(err.from, GenerationPhase::Done);
        assert_eq!(err.to, GenerationPhase::Running);
        assert!(sm.fail("too late").is_err());
    }

    #[test]
    fn test_cannot_restart_running() {
        assert!(!is_legal_transition(
            GenerationPhase::Failed,
            GenerationPhase::Running
        ));
        assert!(!is_legal_transition(
            GenerationPhase::Done,
            GenerationPhase::Done
        ));
    }

    #[test]
    fn test_transition_record_serde() {
        let record = TransitionRecord {
            from: GenerationPhase::Running,
            to: GenerationPhase::Done,
            iteration: 3,
            elapsed_ms: 420,
            reason: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"to\":\"done\""));
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_summary() {
        let mut sm = StateMachine::new();
        sm.set_iteration(1);
        sm.fail("guard").unwrap();
        let summary = sm.summary();
        assert!(summary.contains("Failed"));
        assert!(summary.contains("1 transitions"));
    }
}

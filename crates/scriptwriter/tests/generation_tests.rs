//! Generation loop integration tests.
//!
//! Every test drives the public `ScriptGenerator` API with an in-process
//! scripted model — no inference endpoint required.

use std::collections::VecDeque;
use std::sync::Mutex;

use scriptwriter::{
    ContinuationRequest, FailureCategory, GenerationConfig, GenerationError, OverrunPolicy,
    ScriptGenerator, ScriptModel, TerminationReason,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Replays canned replies in order and records every request it receives.
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<ContinuationRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ContinuationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScriptModel for ScriptedModel {
    async fn complete(&self, request: &ContinuationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::ExternalCall("script exhausted".into())))
    }
}

fn ok(continuation: &str, summary: &str, completed: bool) -> Result<String, GenerationError> {
    Ok(serde_json::json!({
        "continuation": continuation,
        "continuation_summary": summary,
        "completed": completed,
    })
    .to_string())
}

fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_steps_accumulate_in_order() {
    let first = words("a", 30);
    let second = words("b", 20);
    let model = ScriptedModel::new(vec![
        ok(&first, "The farmer finds the goose.", false),
        ok(&second, "The farmer gets greedy.", true),
    ]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let outcome = generator.generate("Golden goose", 50).await.unwrap();

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.word_count(), 50);
    assert_eq!(outcome.state.words_remaining(), 0);
    assert_eq!(outcome.state.script(), format!("{first} {second} "));
    assert_eq!(
        outcome.summary(),
        "The farmer finds the goose. The farmer gets greedy."
    );
    assert_eq!(outcome.reason, TerminationReason::ModelSignalled);
}

#[tokio::test]
async fn requests_carry_summary_and_shrinking_budget() {
    let model = ScriptedModel::new(vec![
        ok(&words("a", 30), "Opening hook.", false),
        ok(&words("b", 10), "Middle.", false),
        ok(&words("c", 5), "Ending.", true),
    ]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    generator.generate("Golden goose", 100).await.unwrap();

    let requests = model.requests();
    assert_eq!(requests.len(), 3);

    let remaining: Vec<i64> = requests.iter().map(|r| r.words_remaining).collect();
    assert_eq!(remaining, vec![100, 70, 60]);
    assert!(remaining.windows(2).all(|w| w[0] >= w[1]));

    assert!(requests[1].prompt.contains("Opening hook."));
    assert!(!requests[1].prompt.contains("a0 a1"));
    assert!(requests[2].prompt.contains("Opening hook. Middle."));
    assert!(requests
        .iter()
        .all(|r| r.preamble == requests[0].preamble));
}

#[tokio::test]
async fn overrun_is_cut_to_budget() {
    let model = ScriptedModel::new(vec![ok(&words("w", 60), "Too long.", false)]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let outcome = generator.generate("t", 50).await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.word_count(), 50);
    assert_eq!(outcome.truncated_words, 10);
    assert_eq!(outcome.reason, TerminationReason::OverrunTruncated);
    assert!(outcome.script().ends_with("w49"));
    assert_eq!(model.requests().len(), 1);
}

#[tokio::test]
async fn overrun_on_later_step_respects_running_total() {
    let model = ScriptedModel::new(vec![
        ok(&words("a", 40), "First.", false),
        ok(&words("b", 25), "Second.", false),
    ]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let outcome = generator.generate("t", 50).await.unwrap();

    assert_eq!(outcome.word_count(), 50);
    assert_eq!(outcome.truncated_words, 15);
    assert!(outcome.script().ends_with("b9"));
}

#[tokio::test]
async fn overrun_fail_policy_aborts() {
    let model = ScriptedModel::new(vec![ok(&words("w", 60), "Too long.", false)]);
    let config = GenerationConfig {
        overrun_policy: OverrunPolicy::Fail,
        ..GenerationConfig::default()
    };

    let generator = ScriptGenerator::new(&model, config);
    let err = generator.generate("t", 50).await.unwrap_err();
    assert_eq!(err.category(), FailureCategory::Budget);
}

#[tokio::test]
async fn exact_budget_without_flag_still_finishes() {
    let model = ScriptedModel::new(vec![
        ok(&words("a", 25), "Half.", false),
        ok(&words("b", 25), "Other half.", false),
    ]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let outcome = generator.generate("t", 50).await.unwrap();
    assert_eq!(outcome.reason, TerminationReason::BudgetExhausted);
    assert_eq!(outcome.iterations, 2);
}

#[tokio::test]
async fn missing_summary_field_aborts_run() {
    let model = ScriptedModel::new(vec![
        ok(&words("a", 10), "Fine.", false),
        Ok(r#"{"continuation": "no summary here", "completed": false}"#.to_string()),
        ok(&words("c", 10), "Never reached.", true),
    ]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let err = generator.generate("t", 100).await.unwrap_err();
    assert_eq!(err.category(), FailureCategory::Schema);
    assert_eq!(model.requests().len(), 2);
}

#[tokio::test]
async fn external_failure_aborts_run() {
    let model = ScriptedModel::new(vec![Err(GenerationError::ExternalCall(
        "connection refused".into(),
    ))]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let err = generator.generate("t", 100).await.unwrap_err();
    assert!(err.is_retriable());
}

#[tokio::test]
async fn model_that_never_finishes_is_stopped() {
    let replies = (0..10).map(|_| ok("two words", "More.", false)).collect();
    let model = ScriptedModel::new(replies);
    let config = GenerationConfig {
        max_iterations: 4,
        min_step_words: 0,
        ..GenerationConfig::default()
    };

    let generator = ScriptGenerator::new(&model, config);
    let err = generator.generate("t", 1000).await.unwrap_err();
    match err {
        GenerationError::MaxIterations {
            iterations,
            word_count,
            max_words,
        } => {
            assert_eq!(iterations, 4);
            assert_eq!(word_count, 8);
            assert_eq!(max_words, 1000);
        }
        other => panic!("expected MaxIterations, got {other:?}"),
    }
    assert_eq!(model.requests().len(), 4);
}

#[tokio::test]
async fn outcome_serializes_for_cli_output() {
    let model = ScriptedModel::new(vec![ok("Short and sweet.", "All of it.", true)]);

    let generator = ScriptGenerator::new(&model, GenerationConfig::default());
    let outcome = generator.generate("t", 10).await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["state"]["word_count"], 3);
    assert_eq!(json["reason"], "model_signalled");
    assert_eq!(json["transitions"][0]["to"], "done");
}

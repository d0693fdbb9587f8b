//! Test: Retry Behavior - bounded retries with linear backoff

use crate::helpers::*;
use serde_json::json;
use skill_pipeline::{Pipeline, SkillRegistry, Step, StepStatus};
use std::time::Instant;

/// Fails twice, succeeds on the third attempt
#[tokio::test]
async fn test_retry_succeeds_on_third_attempt() {
    let flaky = MockSkill::new(vec![
        Err("connection reset".to_string()),
        Err("connection reset".to_string()),
        Ok(json!({"status": "ok"})),
    ]);
    let registry = SkillRegistry::new().with_skill("api", skill("call", flaky.clone()));
    let pipeline = Pipeline::new("retry")
        .with_step(Step::new("call", "api", "call").on_failure("retry:3"));

    let started = Instant::now();
    let run = run_pipeline(registry, pipeline).await;
    let elapsed = started.elapsed();

    assert_pipeline_succeeded(&run);
    assert_step_status(&run, "call", StepStatus::Success);
    assert_eq!(flaky.calls(), 3);
    assert_eq!(run.pipeline.step("call").unwrap().attempts, 3);
    assert_eq!(run.result.step_result("call"), Some(&json!({"status": "ok"})));

    // Two sleeps, each longer than the last
    let delays = run.backoff_delays("call");
    assert_eq!(delays, vec![TEST_BACKOFF, TEST_BACKOFF * 2]);
    assert!(delays[1] > delays[0]);

    // The runner really waits: 1x then 2x the base
    assert!(
        elapsed >= TEST_BACKOFF * 3,
        "expected at least {:?} of backoff, run took {:?}",
        TEST_BACKOFF * 3,
        elapsed
    );
}

/// No retries are attempted after the first success
#[tokio::test]
async fn test_retry_stops_at_first_success() {
    let op = MockSkill::new(vec![Err("blip".to_string()), Ok(json!(1))]);
    let registry = SkillRegistry::new().with_skill("api", skill("call", op.clone()));
    let pipeline = Pipeline::new("retry")
        .with_step(Step::new("call", "api", "call").on_failure("retry:5"));

    let run = run_pipeline(registry, pipeline).await;

    assert_pipeline_succeeded(&run);
    assert_eq!(op.calls(), 2);
    assert_eq!(run.backoff_delays("call").len(), 1);
}

/// Exhausted retries fail the step but not the pipeline
#[tokio::test]
async fn test_exhausted_retry_does_not_fail_pipeline() {
    let broken = MockSkill::failing("service unavailable");
    let after = MockSkill::always(json!({"done": true}));
    let registry = SkillRegistry::new()
        .with_skill("api", skill("call", broken.clone()))
        .with_skill("next", skill("run", after.clone()));
    let pipeline = Pipeline::new("exhausted")
        .with_step(Step::new("call", "api", "call").on_failure("retry:2"))
        .with_step(Step::new("after", "next", "run"));

    let run = run_pipeline(registry, pipeline).await;

    // Compatibility: only stop-policy failures flip the pipeline status
    assert_pipeline_succeeded(&run);
    assert_step_status(&run, "call", StepStatus::Failed);
    assert_step_status(&run, "after", StepStatus::Success);
    assert_eq!(broken.calls(), 2);
    assert_eq!(after.calls(), 1);
    assert_eq!(run.result.steps_failed, 1);
    assert_eq!(
        run.result.errors,
        vec!["call: attempt 1: service unavailable; attempt 2: service unavailable".to_string()]
    );
    assert!(!run.result.context.contains_key("call"));
}

/// A malformed retry count means a single attempt
#[tokio::test]
async fn test_malformed_retry_count_runs_once() {
    let broken = MockSkill::failing("nope");
    let registry = SkillRegistry::new().with_skill("api", skill("call", broken.clone()));
    let pipeline = Pipeline::new("malformed")
        .with_step(Step::new("call", "api", "call").on_failure("retry:many"));

    let run = run_pipeline(registry, pipeline).await;

    assert_eq!(broken.calls(), 1);
    assert!(run.backoff_delays("call").is_empty());
    assert_step_status(&run, "call", StepStatus::Failed);
}

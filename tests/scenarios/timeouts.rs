//! Test: Timeouts and cancellation

use crate::helpers::*;
use serde_json::{json, Value};
use skill_pipeline::core::Params;
use skill_pipeline::{ExecutionStatus, Pipeline, Skill, SkillRegistry, Step, StepStatus};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A step over its time limit fails with a timeout error
#[tokio::test]
async fn test_timeout_fails_step() {
    let slow = MockSkill::always(json!("late")).with_delay(Duration::from_secs(5));
    let registry = SkillRegistry::new().with_skill("slow", skill("run", slow.clone()));
    let pipeline = Pipeline::new("slow")
        .with_step(Step::new("slow", "slow", "run").with_timeout(Duration::from_millis(50)));

    let started = Instant::now();
    let run = run_pipeline(registry, pipeline).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_pipeline_failed(&run);
    assert_step_status(&run, "slow", StepStatus::Failed);
    assert!(run.step_error("slow").unwrap().contains("timed out"));
}

/// Timeouts count as attempts under a retry policy
#[tokio::test]
async fn test_timeout_is_retried() {
    let slow = MockSkill::always(json!("late")).with_delay(Duration::from_secs(5));
    let registry = SkillRegistry::new().with_skill("slow", skill("run", slow.clone()));
    let pipeline = Pipeline::new("slow").with_step(
        Step::new("slow", "slow", "run")
            .with_timeout(Duration::from_millis(20))
            .on_failure("retry:2"),
    );

    let run = run_pipeline(registry, pipeline).await;

    assert_eq!(slow.calls(), 2);
    assert_eq!(run.backoff_delays("slow").len(), 1);
    assert_step_status(&run, "slow", StepStatus::Failed);
    assert_pipeline_succeeded(&run);
}

/// Cancelling during a step lets it finish, then nothing else starts
#[tokio::test]
async fn test_cancel_between_steps() {
    init_tracing();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let after = MockSkill::echo();
    let registry = SkillRegistry::new()
        .with_skill(
            "control",
            Skill::new().with_fn("stop", move |_params: Params| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    Ok(Value::from("stopping"))
                }
            }),
        )
        .with_skill("after", skill("run", after.clone()));
    let mut pipeline = Pipeline::new("cancel")
        .with_step(Step::new("first", "control", "stop"))
        .with_step(Step::new("second", "after", "run").depends_on(["first"]));

    let result = test_engine(registry)
        .execute_with_cancel(&mut pipeline, HashMap::new(), cancel)
        .await;

    assert_eq!(result.status, ExecutionStatus::Cancelled);
    assert_eq!(result.steps_completed, 1);
    assert_eq!(result.step_result("first"), Some(&json!("stopping")));
    assert_eq!(pipeline.step("second").unwrap().status, StepStatus::Pending);
    assert_eq!(after.calls(), 0);
}

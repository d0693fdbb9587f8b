//! Test: Conditions - gating steps on earlier outputs

use crate::helpers::*;
use serde_json::json;
use skill_pipeline::execution::ExecutionEvent;
use skill_pipeline::{Pipeline, SkillRegistry, Step, StepStatus};

fn gate_registry(check: MockSkill, act: &MockSkill) -> SkillRegistry {
    SkillRegistry::new()
        .with_skill("check", skill("run", check))
        .with_skill("act", skill("run", act.clone()))
}

/// Equality against a matching literal lets the step run
#[tokio::test]
async fn test_equality_condition_met() {
    let act = MockSkill::always(json!({"acted": true}));
    let registry = gate_registry(MockSkill::always(json!({"status": "ok"})), &act);
    let pipeline = Pipeline::new("gate")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition(r#"context.check.status == "ok""#),
        );

    let run = run_pipeline(registry, pipeline).await;

    assert_pipeline_succeeded(&run);
    assert_step_status(&run, "act", StepStatus::Success);
    assert_eq!(act.calls(), 1);
}

/// A false condition skips the step without invoking anything
#[tokio::test]
async fn test_false_condition_skips_step() {
    let act = MockSkill::always(json!({"acted": true}));
    let registry = gate_registry(MockSkill::always(json!({"status": "bad"})), &act);
    let pipeline = Pipeline::new("gate")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check.status == 'ok'"),
        );

    let run = run_pipeline(registry, pipeline).await;

    assert_pipeline_succeeded(&run);
    assert_step_status(&run, "act", StepStatus::Skipped);
    assert_eq!(act.calls(), 0);
    assert_eq!(run.result.steps_skipped, 1);
    assert_eq!(run.result.steps_completed, 1);
    assert!(!run.result.context.contains_key("act"));
    assert!(run.events.iter().any(|e| matches!(
        e,
        ExecutionEvent::StepSkipped { step, reason } if step == "act" && reason.contains("condition not met")
    )));
    assert_eq!(run.started_steps(), vec!["check".to_string()]);
}

/// Inequality runs when the field differs
#[tokio::test]
async fn test_inequality_condition() {
    let act = MockSkill::echo();
    let registry = gate_registry(MockSkill::always(json!({"count": 3})), &act);
    let pipeline = Pipeline::new("gate")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check.count != 0"),
        );

    let run = run_pipeline(registry, pipeline).await;

    assert_step_status(&run, "act", StepStatus::Success);
}

/// Truthiness of a whole step output
#[tokio::test]
async fn test_truthy_condition_on_empty_output_skips() {
    let act = MockSkill::echo();
    let registry = gate_registry(MockSkill::always(json!({})), &act);
    let pipeline = Pipeline::new("gate")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check"),
        );

    let run = run_pipeline(registry, pipeline).await;

    assert_step_status(&run, "act", StepStatus::Skipped);
    assert_eq!(act.calls(), 0);
}

/// A step gated on a skipped step sees no output and is skipped too
#[tokio::test]
async fn test_skip_cascades_through_conditions() {
    let act = MockSkill::always(json!({"acted": true}));
    let report = MockSkill::echo();
    let registry = gate_registry(MockSkill::always(json!({"status": "bad"})), &act)
        .with_skill("report", skill("run", report.clone()));
    let pipeline = Pipeline::new("cascade")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check.status == ok"),
        )
        .with_step(
            Step::new("report", "report", "run")
                .depends_on(["act"])
                .with_condition("context.act"),
        );

    let run = run_pipeline(registry, pipeline).await;

    assert_pipeline_succeeded(&run);
    assert_step_status(&run, "act", StepStatus::Skipped);
    assert_step_status(&run, "report", StepStatus::Skipped);
    assert_eq!(run.result.steps_skipped, 2);
}

/// Dependents of a skipped step without their own condition still run
#[tokio::test]
async fn test_dependent_of_skipped_step_still_runs() {
    let act = MockSkill::always(json!({"acted": true}));
    let after = MockSkill::echo();
    let registry = gate_registry(MockSkill::always(json!({"status": "bad"})), &act)
        .with_skill("after", skill("run", after.clone()));
    let pipeline = Pipeline::new("ungated")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check.status == ok"),
        )
        .with_step(Step::new("after", "after", "run").depends_on(["act"]));

    let run = run_pipeline(registry, pipeline).await;

    assert_step_status(&run, "act", StepStatus::Skipped);
    assert_step_status(&run, "after", StepStatus::Success);
    assert_eq!(after.calls(), 1);
}

/// Expressions outside the supported forms let the step run
#[tokio::test]
async fn test_unrecognized_condition_runs_step() {
    let act = MockSkill::echo();
    let registry = gate_registry(MockSkill::always(json!({"count": 3})), &act);
    let pipeline = Pipeline::new("lenient")
        .with_step(Step::new("check", "check", "run"))
        .with_step(
            Step::new("act", "act", "run")
                .depends_on(["check"])
                .with_condition("context.check.count > 10"),
        );

    let run = run_pipeline(registry, pipeline).await;

    let condition = run.pipeline.step("act").unwrap().condition.clone().unwrap();
    assert!(!condition.is_recognized());
    assert_step_status(&run, "act", StepStatus::Success);
    assert_eq!(act.calls(), 1);
}

//! Snapshot of a finished pipeline run

use crate::core::{
    pipeline::Pipeline,
    state::{ExecutionStatus, StepStatus},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one `execute()` call, owned by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub execution_id: Uuid,
    pub pipeline_name: String,
    pub status: ExecutionStatus,
    pub steps_completed: usize,
    pub steps_failed: usize,
    pub steps_skipped: usize,
    pub duration: Duration,

    /// Step name -> result for every successful step
    pub step_results: HashMap<String, Value>,

    /// `"<step>: <error>"` entries, or the single topology error
    pub errors: Vec<String>,

    /// Final context
    pub context: HashMap<String, Value>,
}

impl PipelineResult {
    /// Build a snapshot from the pipeline's current state
    pub fn from_pipeline(pipeline: &Pipeline, errors: Vec<String>) -> Self {
        let step_results = pipeline
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Success)
            .filter_map(|s| s.result.clone().map(|r| (s.name.clone(), r)))
            .collect();

        PipelineResult {
            execution_id: pipeline.execution_id,
            pipeline_name: pipeline.name.clone(),
            status: pipeline.status,
            steps_completed: pipeline.count_with_status(StepStatus::Success),
            steps_failed: pipeline.count_with_status(StepStatus::Failed),
            steps_skipped: pipeline.count_with_status(StepStatus::Skipped),
            duration: pipeline.duration.unwrap_or_default(),
            step_results,
            errors,
            context: pipeline.context.snapshot(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn step_result(&self, step_name: &str) -> Option<&Value> {
        self.step_results.get(step_name)
    }
}

//! Pipeline domain model

use crate::core::{
    context::PipelineContext,
    state::{ExecutionStatus, StepStatus},
    step::Step,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// A pipeline definition plus the state of its current run
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Steps in definition order
    pub steps: Vec<Step>,

    /// Outputs of completed steps, keyed by step name
    pub context: PipelineContext,

    /// Id of the current (or last) run
    pub execution_id: Uuid,

    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Pipeline {
            name: name.into(),
            steps: Vec::new(),
            context: PipelineContext::new(),
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::NotStarted,
            started_at: None,
            completed_at: None,
            duration: None,
        }
    }

    /// Append a step (builder style)
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Get a mutable step by name
    pub fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.name == name)
    }

    /// Prepare for a fresh run: new execution id, pending steps, empty context
    pub fn reset(&mut self) {
        self.execution_id = Uuid::new_v4();
        self.status = ExecutionStatus::NotStarted;
        self.started_at = None;
        self.completed_at = None;
        self.duration = None;
        self.context.clear();
        for step in &mut self.steps {
            step.reset();
        }
    }

    /// Number of steps currently in `status`
    pub fn count_with_status(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }
}

//! Step domain model

use crate::core::{
    condition::Condition,
    policy::FailurePolicy,
    state::StepStatus,
    template::Params,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Timeout applied when a definition does not name one
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// A single step in a pipeline
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step name within the pipeline
    pub name: String,

    /// Registered capability to invoke
    pub skill: String,

    /// Operation on that capability
    pub method: String,

    /// Parameters, possibly containing `{{context.<step>.<field>}}` placeholders
    pub params: Params,

    /// Names of steps that must complete first
    pub depends_on: Vec<String>,

    /// Optional gate evaluated before the step runs
    pub condition: Option<Condition>,

    /// Failure handling
    pub on_failure: FailurePolicy,

    /// Hard deadline for each invocation
    pub timeout: Duration,

    /// Runtime state
    pub status: StepStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub duration: Option<Duration>,
    pub attempts: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Set when a fallback recovered the step
    pub note: Option<String>,
}

impl Step {
    pub fn new(name: impl Into<String>, skill: impl Into<String>, method: impl Into<String>) -> Self {
        Step {
            name: name.into(),
            skill: skill.into(),
            method: method.into(),
            params: Params::new(),
            depends_on: Vec::new(),
            condition: None,
            on_failure: FailurePolicy::Stop,
            timeout: DEFAULT_STEP_TIMEOUT,
            status: StepStatus::Pending,
            result: None,
            error: None,
            duration: None,
            attempts: 0,
            started_at: None,
            completed_at: None,
            note: None,
        }
    }

    /// Replace the parameters
    ///
    /// Params are always a JSON object. Any other value (array, string,
    /// number, null) leaves the current params unchanged.
    pub fn with_params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.params = map;
        }
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Condition::parse(condition);
        self
    }

    pub fn on_failure(mut self, policy: impl Into<FailurePolicy>) -> Self {
        self.on_failure = policy.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Move to `next`, refusing transitions the lifecycle forbids
    pub fn transition(&mut self, next: StepStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(
                step = %self.name,
                from = %self.status,
                to = %next,
                "Ignoring invalid step transition"
            );
            return false;
        }
        self.status = next;
        true
    }

    /// Clear run-state so the step can execute again
    pub fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.result = None;
        self.error = None;
        self.duration = None;
        self.attempts = 0;
        self.started_at = None;
        self.completed_at = None;
        self.note = None;
    }

    /// `skill.method` label for logs and errors
    pub fn target(&self) -> String {
        format!("{}.{}", self.skill, self.method)
    }
}

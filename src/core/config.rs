//! Pipeline definition documents
//!
//! Mirrors the definition format field for field. Parsing works on strings;
//! where the document comes from is the caller's business.

use crate::core::{
    condition::Condition,
    policy::FailurePolicy,
    step::{Step, DEFAULT_STEP_TIMEOUT},
    template::Params,
    Pipeline,
};
use crate::execution::scheduler::topological_order;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Top-level pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Default timeout for steps (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,

    /// Pipeline steps
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step name
    pub name: String,

    pub skill: String,

    pub method: String,

    /// Parameters, may contain `{{context.<step>.<field>}}` templates
    #[serde(default)]
    pub params: Params,

    /// Names of steps this step depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Optional gate expression
    #[serde(default)]
    pub condition: Option<String>,

    /// `stop`, `skip`, `retry:N` or `fallback:skill.method`
    #[serde(default = "default_on_failure")]
    pub on_failure: String,

    /// Timeout for this step (overrides the pipeline default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_on_failure() -> String {
    "stop".to_string()
}

impl PipelineConfig {
    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse pipeline configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                anyhow::bail!("Pipeline '{}' has a step with an empty name", self.name);
            }
            if !seen.insert(step.name.as_str()) {
                anyhow::bail!("Duplicate step name: {}", step.name);
            }
            if step.skill.is_empty() || step.method.is_empty() {
                anyhow::bail!("Step '{}' must name both a skill and a method", step.name);
            }
        }

        // Unknown dependencies and cycles
        let steps: Vec<Step> = self.steps.iter().map(|s| s.to_step(DEFAULT_STEP_TIMEOUT)).collect();
        topological_order(&steps)?;

        Ok(())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        let default_timeout = self
            .default_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STEP_TIMEOUT);

        self.steps
            .iter()
            .fold(Pipeline::new(self.name.clone()), |pipeline, step| {
                pipeline.with_step(step.to_step(default_timeout))
            })
    }
}

impl StepConfig {
    /// Build the domain step, parsing the policy and condition once
    pub fn to_step(&self, default_timeout: Duration) -> Step {
        let mut step = Step::new(&self.name, &self.skill, &self.method);
        step.params = self.params.clone();
        step.depends_on = self.depends_on.clone();
        step.condition = self.condition.as_deref().and_then(Condition::parse);
        step.on_failure = FailurePolicy::parse(&self.on_failure);
        step.timeout = self
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);
        step
    }
}

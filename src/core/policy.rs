//! Failure policy attached to each step

use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when a step's invocation fails
///
/// Parsed once from the definition string (`stop`, `skip`, `retry:N`,
/// `fallback:skill.method`). Anything unrecognized becomes `Stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Fail the step and halt the pipeline
    Stop,
    /// Fail the step and keep going
    Skip,
    /// Run the invocation up to `max_attempts` times
    Retry { max_attempts: usize },
    /// After the primary attempt fails, invoke another skill once
    Fallback { skill: String, method: String },
}

impl FailurePolicy {
    /// Parse a policy string
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "stop" => return FailurePolicy::Stop,
            "skip" => return FailurePolicy::Skip,
            _ => {}
        }

        if let Some(count) = raw.strip_prefix("retry:") {
            let max_attempts = count.trim().parse::<usize>().unwrap_or(1).max(1);
            return FailurePolicy::Retry { max_attempts };
        }

        if let Some(target) = raw.strip_prefix("fallback:") {
            if let Some((skill, method)) = target.trim().split_once('.') {
                if !skill.is_empty() && !method.is_empty() {
                    return FailurePolicy::Fallback {
                        skill: skill.to_string(),
                        method: method.to_string(),
                    };
                }
            }
        }

        FailurePolicy::Stop
    }

    /// Number of primary invocation attempts this policy allows
    pub fn max_attempts(&self) -> usize {
        match self {
            FailurePolicy::Retry { max_attempts } => *max_attempts,
            _ => 1,
        }
    }

    /// Whether a failure under this policy halts the pipeline
    pub fn halts_pipeline(&self) -> bool {
        matches!(self, FailurePolicy::Stop)
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Stop
    }
}

impl From<&str> for FailurePolicy {
    fn from(raw: &str) -> Self {
        FailurePolicy::parse(raw)
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Stop => write!(f, "stop"),
            FailurePolicy::Skip => write!(f, "skip"),
            FailurePolicy::Retry { max_attempts } => write!(f, "retry:{}", max_attempts),
            FailurePolicy::Fallback { skill, method } => write!(f, "fallback:{}.{}", skill, method),
        }
    }
}

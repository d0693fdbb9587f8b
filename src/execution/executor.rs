//! Step executor - runs one step against the capability registry

use crate::{
    capability::{CapabilityRegistry, InvocationError},
    core::{
        template::{resolve_params, Params},
        FailurePolicy, PipelineContext, Step, StepStatus,
    },
    execution::{config::EngineConfig, events::{EventBus, ExecutionEvent}},
};
use chrono::Utc;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Executes a single step, applying its timeout, retry and fallback policy
pub struct StepExecutor<R> {
    registry: R,
    config: EngineConfig,
    events: EventBus,
}

impl<R: CapabilityRegistry> StepExecutor<R> {
    pub fn new(registry: R, config: EngineConfig, events: EventBus) -> Self {
        Self {
            registry,
            config,
            events,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Execute a step, updating its status, result, error and duration
    ///
    /// Returns true when the step ends in `Success`.
    pub async fn execute(&self, step: &mut Step, context: &PipelineContext) -> bool {
        info!(step = %step.name, target = %step.target(), policy = %step.on_failure, "Executing step");

        let started = Instant::now();
        step.started_at = Some(Utc::now());
        step.transition(StepStatus::Running);
        self.events
            .emit(ExecutionEvent::StepStarted {
                step: step.name.clone(),
            })
            .await;

        let max_attempts = step.on_failure.max_attempts();
        let mut trail = Vec::new();

        for attempt in 1..=max_attempts {
            step.attempts = attempt;

            // Resolve on every attempt so each one gets a fresh copy
            let params = resolve_params(&step.params, context);
            let rendered = Value::Object(params.clone());
            debug!(step = %step.name, attempt, params = %rendered, "Resolved params");

            match self.invoke(&step.skill, &step.method, params, step.timeout).await {
                Ok(result) => {
                    self.mark_success(step, result, started);
                    return true;
                }
                Err(e) => {
                    warn!(step = %step.name, attempt, max_attempts, error = %e, "Step attempt failed");
                    if max_attempts > 1 {
                        trail.push(format!("attempt {}: {}", attempt, e));
                    } else {
                        trail.push(e.to_string());
                    }

                    if attempt < max_attempts {
                        let delay = self.config.backoff_for(attempt);
                        info!(step = %step.name, attempt, delay_ms = %delay.as_millis(), "Retrying after backoff");
                        self.events
                            .emit(ExecutionEvent::StepRetrying {
                                step: step.name.clone(),
                                attempt,
                                max_attempts,
                                delay,
                                error: e.to_string(),
                            })
                            .await;
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        if let FailurePolicy::Fallback { skill, method } = step.on_failure.clone() {
            let target = format!("{}.{}", skill, method);
            info!(step = %step.name, fallback = %target, "Primary attempts exhausted, invoking fallback");
            self.events
                .emit(ExecutionEvent::StepFallback {
                    step: step.name.clone(),
                    target: target.clone(),
                })
                .await;

            let params = resolve_params(&step.params, context);
            match self.invoke(&skill, &method, params, step.timeout).await {
                Ok(result) => {
                    step.note = Some(format!(
                        "recovered via fallback {} after: {}",
                        target,
                        trail.join("; ")
                    ));
                    self.mark_success(step, result, started);
                    return true;
                }
                Err(e) => {
                    warn!(step = %step.name, fallback = %target, error = %e, "Fallback failed");
                    trail.push(format!("fallback {}: {}", target, e));
                }
            }
        }

        self.mark_failed(step, trail.join("; "), started);
        false
    }

    /// Resolve `skill.method` and run it under `limit`
    async fn invoke(
        &self,
        skill: &str,
        method: &str,
        params: Params,
        limit: Duration,
    ) -> Result<Value, InvocationError> {
        let operation = self.registry.resolve(skill, method)?;
        match timeout(limit, operation.invoke(params)).await {
            Ok(result) => result,
            Err(_) => Err(InvocationError::Timeout(limit)),
        }
    }

    fn mark_success(&self, step: &mut Step, result: Value, started: Instant) {
        step.transition(StepStatus::Success);
        step.result = Some(result);
        step.error = None;
        step.duration = Some(started.elapsed());
        step.completed_at = Some(Utc::now());
        info!(step = %step.name, attempts = step.attempts, "Step completed successfully");
    }

    fn mark_failed(&self, step: &mut Step, error: String, started: Instant) {
        step.transition(StepStatus::Failed);
        step.result = None;
        step.error = Some(error);
        step.duration = Some(started.elapsed());
        step.completed_at = Some(Utc::now());
    }
}

//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    capability::{check_bindings, BindingError, CapabilityRegistry},
    core::{ExecutionStatus, Pipeline, PipelineContext, PipelineResult, StepStatus},
    execution::{
        config::EngineConfig,
        events::{EventBus, ExecutionEvent},
        executor::StepExecutor,
        scheduler::{topological_order, TopologyError},
    },
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Problems found by [`ExecutionEngine::validate`]
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("{} unresolved capability binding(s): {}", .0.len(), format_bindings(.0))]
    Bindings(Vec<BindingError>),
}

fn format_bindings(errors: &[BindingError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main pipeline execution engine
///
/// Steps run strictly one after another in dependency order. Independent
/// pipelines can be executed concurrently on the same engine.
pub struct ExecutionEngine<R> {
    executor: Arc<StepExecutor<R>>,
    events: EventBus,
}

impl<R: CapabilityRegistry + 'static> ExecutionEngine<R> {
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: R, config: EngineConfig) -> Self {
        let events = EventBus::new();
        let executor = Arc::new(StepExecutor::new(registry, config, events.clone()));

        Self { executor, events }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler).await;
    }

    /// Check the graph and every capability binding without running anything
    pub fn validate(&self, pipeline: &Pipeline) -> Result<(), ValidationError> {
        topological_order(&pipeline.steps)?;

        let bindings = check_bindings(pipeline, self.executor.registry());
        if !bindings.is_empty() {
            return Err(ValidationError::Bindings(bindings));
        }
        Ok(())
    }

    /// Execute the entire pipeline
    ///
    /// Step failures never escape: they are reported in the returned result.
    pub async fn execute(
        &self,
        pipeline: &mut Pipeline,
        seed: HashMap<String, Value>,
    ) -> PipelineResult {
        self.execute_with_cancel(pipeline, seed, CancellationToken::new())
            .await
    }

    /// Execute, stopping before the next step once `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        pipeline: &mut Pipeline,
        seed: HashMap<String, Value>,
        cancel: CancellationToken,
    ) -> PipelineResult {
        pipeline.reset();
        pipeline.context = PipelineContext::from_seed(seed);

        let execution_id = pipeline.execution_id;
        let started = Instant::now();
        pipeline.started_at = Some(Utc::now());
        pipeline.status = ExecutionStatus::Running;

        info!(pipeline = %pipeline.name, %execution_id, steps = pipeline.steps.len(), "Starting pipeline execution");
        self.events
            .emit(ExecutionEvent::PipelineStarted {
                execution_id,
                pipeline_name: pipeline.name.clone(),
            })
            .await;

        let order = match topological_order(&pipeline.steps) {
            Ok(order) => order,
            Err(e) => {
                error!(pipeline = %pipeline.name, error = %e, "Invalid dependency graph, no step will run");
                return self
                    .finish(pipeline, ExecutionStatus::Failed, started, vec![e.to_string()])
                    .await;
            }
        };

        let mut errors = Vec::new();
        let mut halted = false;
        let mut cancelled = false;

        for index in order {
            if cancel.is_cancelled() {
                warn!(pipeline = %pipeline.name, "Pipeline cancelled, not starting further steps");
                cancelled = true;
                break;
            }

            let step = &mut pipeline.steps[index];
            let context = &mut pipeline.context;

            let allowed = step
                .condition
                .as_ref()
                .map_or(true, |condition| condition.evaluate(context));
            if !allowed {
                let reason = step
                    .condition
                    .as_ref()
                    .map(|c| format!("condition not met: {}", c))
                    .unwrap_or_default();
                info!(step = %step.name, %reason, "Skipping step");
                step.transition(StepStatus::Skipped);
                self.events
                    .emit(ExecutionEvent::StepSkipped {
                        step: step.name.clone(),
                        reason,
                    })
                    .await;
                continue;
            }

            if self.executor.execute(step, context).await {
                if let Some(result) = &step.result {
                    context.set_step_output(&step.name, result.clone());
                }
                self.events
                    .emit(ExecutionEvent::StepCompleted {
                        step: step.name.clone(),
                        attempts: step.attempts,
                    })
                    .await;
                continue;
            }

            let message = step.error.clone().unwrap_or_default();
            error!(step = %step.name, error = %message, policy = %step.on_failure, "Step failed");
            errors.push(format!("{}: {}", step.name, message));
            self.events
                .emit(ExecutionEvent::StepFailed {
                    step: step.name.clone(),
                    error: message,
                })
                .await;

            if step.on_failure.halts_pipeline() {
                info!(step = %step.name, "Stop policy triggered, halting pipeline");
                halted = true;
                break;
            }
        }

        // Only a stop-policy failure fails the pipeline; exhausted retries,
        // skips and failed fallbacks leave it successful.
        let status = if halted {
            ExecutionStatus::Failed
        } else if cancelled {
            ExecutionStatus::Cancelled
        } else {
            ExecutionStatus::Success
        };

        self.finish(pipeline, status, started, errors).await
    }

    async fn finish(
        &self,
        pipeline: &mut Pipeline,
        status: ExecutionStatus,
        started: Instant,
        errors: Vec<String>,
    ) -> PipelineResult {
        pipeline.status = status;
        pipeline.completed_at = Some(Utc::now());
        pipeline.duration = Some(started.elapsed());

        info!(
            pipeline = %pipeline.name,
            status = ?status,
            duration_ms = %started.elapsed().as_millis(),
            "Pipeline execution finished"
        );
        self.events
            .emit(ExecutionEvent::PipelineCompleted {
                execution_id: pipeline.execution_id,
                status,
            })
            .await;

        PipelineResult::from_pipeline(pipeline, errors)
    }
}

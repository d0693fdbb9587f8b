//! Core domain models for Pipeline
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, and their configuration.

pub mod condition;
pub mod config;
pub mod context;
pub mod pipeline;
pub mod policy;
pub mod result;
pub mod state;
pub mod step;
pub mod template;

pub use condition::Condition;
pub use context::PipelineContext;
pub use pipeline::Pipeline;
pub use policy::FailurePolicy;
pub use result::PipelineResult;
pub use state::{ExecutionStatus, StepStatus};
pub use step::{Step, DEFAULT_STEP_TIMEOUT};
pub use template::Params;

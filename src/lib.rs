//! skill-pipeline - a dependency-ordered workflow engine for skill invocations

pub mod capability;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use capability::{
    Capability, CapabilityRegistry, InvocationError, Operation, Skill, SkillRegistry,
};
pub use core::{
    ExecutionStatus, FailurePolicy, Params, Pipeline, PipelineContext, PipelineResult, Step,
    StepStatus,
};
pub use execution::{EngineConfig, ExecutionEngine, ExecutionEvent, TopologyError};

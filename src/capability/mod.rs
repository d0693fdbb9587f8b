//! Capability registry seam
//!
//! The engine never knows how a skill is implemented. It asks a
//! [`CapabilityRegistry`] for a named [`Capability`], asks that for a named
//! [`Operation`], and invokes it with resolved parameters.

pub mod registry;

use crate::core::template::Params;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use registry::{check_bindings, BindingError, FnOperation, Skill, SkillRegistry};

/// Errors raised while invoking a step's operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("skill '{0}' not found")]
    SkillNotFound(String),

    #[error("method '{method}' not found on skill '{skill}'")]
    MethodNotFound { skill: String, method: String },

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl InvocationError {
    pub fn failed(message: impl Into<String>) -> Self {
        InvocationError::Failed(message.into())
    }
}

/// A single invocable operation
#[async_trait]
pub trait Operation: Send + Sync {
    /// Run the operation. `Ok` carries the step result.
    async fn invoke(&self, params: Params) -> Result<Value, InvocationError>;
}

/// A named unit exposing operations
pub trait Capability: Send + Sync {
    /// Get the operation registered under `method`
    fn operation(&self, method: &str) -> Option<Arc<dyn Operation>>;
}

/// Read-only lookup of capabilities by skill name
pub trait CapabilityRegistry: Send + Sync {
    fn lookup(&self, skill: &str) -> Option<Arc<dyn Capability>>;

    /// Resolve `skill.method` to an invocable operation
    fn resolve(&self, skill: &str, method: &str) -> Result<Arc<dyn Operation>, InvocationError> {
        let capability = self
            .lookup(skill)
            .ok_or_else(|| InvocationError::SkillNotFound(skill.to_string()))?;
        capability
            .operation(method)
            .ok_or_else(|| InvocationError::MethodNotFound {
                skill: skill.to_string(),
                method: method.to_string(),
            })
    }
}

impl<T: CapabilityRegistry + ?Sized> CapabilityRegistry for Arc<T> {
    fn lookup(&self, skill: &str) -> Option<Arc<dyn Capability>> {
        (**self).lookup(skill)
    }
}

//! In-memory capability registry

use crate::capability::{Capability, CapabilityRegistry, InvocationError, Operation};
use crate::core::{pipeline::Pipeline, policy::FailurePolicy, template::Params};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Operation backed by an async closure
pub struct FnOperation<F> {
    f: F,
}

impl<F> FnOperation<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
{
    async fn invoke(&self, params: Params) -> Result<Value, InvocationError> {
        (self.f)(params).await
    }
}

/// A capability assembled from named operations
#[derive(Default, Clone)]
pub struct Skill {
    operations: HashMap<String, Arc<dyn Operation>>,
}

impl Skill {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under `method`
    pub fn with_operation(mut self, method: impl Into<String>, operation: impl Operation + 'static) -> Self {
        self.operations.insert(method.into(), Arc::new(operation));
        self
    }

    /// Register an async closure under `method`
    pub fn with_fn<F, Fut>(self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        self.with_operation(method, FnOperation::new(f))
    }

    /// Names of the registered operations
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Capability for Skill {
    fn operation(&self, method: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(method).cloned()
    }
}

impl std::fmt::Debug for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skill").field("methods", &self.methods()).finish()
    }
}

/// Registry holding capabilities in a map
#[derive(Default, Clone)]
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Capability>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, capability: impl Capability + 'static) {
        self.skills.insert(name.into(), Arc::new(capability));
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_skill(mut self, name: impl Into<String>, capability: impl Capability + 'static) -> Self {
        self.register(name, capability);
        self
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl CapabilityRegistry for SkillRegistry {
    fn lookup(&self, skill: &str) -> Option<Arc<dyn Capability>> {
        self.skills.get(skill).cloned()
    }
}

/// A step whose `skill.method` does not resolve
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("step '{step}' cannot bind '{target}': {source}")]
pub struct BindingError {
    pub step: String,
    pub target: String,
    #[source]
    pub source: InvocationError,
}

/// Check that every primary and fallback operation in `pipeline` resolves
pub fn check_bindings<R>(pipeline: &Pipeline, registry: &R) -> Vec<BindingError>
where
    R: CapabilityRegistry + ?Sized,
{
    let mut errors = Vec::new();

    for step in &pipeline.steps {
        let mut targets = vec![(step.skill.as_str(), step.method.as_str())];
        if let FailurePolicy::Fallback { skill, method } = &step.on_failure {
            targets.push((skill.as_str(), method.as_str()));
        }

        for (skill, method) in targets {
            if let Err(source) = registry.resolve(skill, method) {
                errors.push(BindingError {
                    step: step.name.clone(),
                    target: format!("{}.{}", skill, method),
                    source,
                });
            }
        }
    }

    errors
}

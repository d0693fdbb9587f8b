//! Pipeline context - data shared between steps

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Execution context for a pipeline run
///
/// Keyed by step name. A step's successful result is written here as soon
/// as the step completes, and is visible to every later step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineContext {
    values: HashMap<String, Value>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-populated with seed values
    pub fn from_seed(seed: HashMap<String, Value>) -> Self {
        Self { values: seed }
    }

    /// Set the output of a step
    pub fn set_step_output(&mut self, step_name: &str, output: Value) {
        self.values.insert(step_name.to_string(), output);
    }

    /// Get the output of a step
    pub fn get_step_output(&self, step_name: &str) -> Option<&Value> {
        self.values.get(step_name)
    }

    /// Get a single field of a step's output, if that output is an object
    pub fn get_field(&self, step_name: &str, field: &str) -> Option<&Value> {
        self.values
            .get(step_name)
            .and_then(|output| output.as_object())
            .and_then(|object| object.get(field))
    }

    /// Merge values into the context, overwriting existing keys
    pub fn extend(&mut self, values: HashMap<String, Value>) {
        self.values.extend(values);
    }

    pub fn contains(&self, step_name: &str) -> bool {
        self.values.contains_key(step_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Copy of the underlying map
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.clone()
    }
}

/// Render a context value as text for templates and comparisons
///
/// Strings are used verbatim; everything else uses its JSON form.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truthiness of a context value
///
/// `null`, `false`, zero, and empty strings, arrays, or objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

//! Parameter templating
//!
//! Step parameters may reference earlier outputs with
//! `{{context.<step>.<field>}}`. Placeholders whose step or field is not in
//! the context are left untouched.

use crate::core::context::{value_to_text, PipelineContext};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Step parameters: a JSON object
pub type Params = Map<String, Value>;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*context\.([A-Za-z0-9_\-]+)\.([A-Za-z0-9_\-]+)\s*\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Resolve every placeholder in `params`, returning a fresh copy
pub fn resolve_params(params: &Params, context: &PipelineContext) -> Params {
    params
        .iter()
        .map(|(key, value)| (key.clone(), resolve_value(value, context)))
        .collect()
}

/// Resolve placeholders in a single value, recursing into arrays and objects
pub fn resolve_value(value: &Value, context: &PipelineContext) -> Value {
    match value {
        Value::String(s) => Value::String(render_string(s, context)),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| resolve_value(item, context)).collect(),
        ),
        Value::Object(fields) => Value::Object(resolve_params(fields, context)),
        other => other.clone(),
    }
}

/// Substitute placeholders inside one string
pub fn render_string(template: &str, context: &PipelineContext) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            match context.get_field(&caps[1], &caps[2]) {
                Some(value) => value_to_text(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

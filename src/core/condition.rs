//! Step condition expressions
//!
//! Supported forms:
//! ```text
//! context.<step>                      truthy check on a step's output
//! context.<step>.<field> == <literal> text equality
//! context.<step>.<field> != <literal> text inequality
//! ```
//! Literals may be bare words or single/double quoted. Any other expression
//! parses to [`Condition::Unrecognized`], which evaluates to true.

use crate::core::context::{is_truthy, value_to_text, PipelineContext};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A parsed step condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `context.<step>`
    Truthy { step: String },
    /// `context.<step>.<field> == <literal>`
    Eq {
        step: String,
        field: String,
        literal: String,
    },
    /// `context.<step>.<field> != <literal>`
    NotEq {
        step: String,
        field: String,
        literal: String,
    },
    /// Anything else. Kept verbatim and allowed to run.
    Unrecognized(String),
}

impl Condition {
    /// Parse a condition string. Blank input means "no condition".
    pub fn parse(raw: &str) -> Option<Self> {
        let expr = raw.trim();
        if expr.is_empty() {
            return None;
        }

        Some(Self::parse_comparison(expr).unwrap_or_else(|| {
            match parse_reference(expr) {
                Some((step, None)) => Condition::Truthy { step },
                _ => Condition::Unrecognized(expr.to_string()),
            }
        }))
    }

    fn parse_comparison(expr: &str) -> Option<Self> {
        let eq = expr.find("==");
        let ne = expr.find("!=");
        let (pos, negated) = match (eq, ne) {
            (Some(e), Some(n)) if n < e => (n, true),
            (Some(e), _) => (e, false),
            (None, Some(n)) => (n, true),
            (None, None) => return None,
        };

        let (step, field) = match parse_reference(expr[..pos].trim()) {
            Some((step, Some(field))) => (step, field),
            _ => return None,
        };
        let literal = parse_literal(expr[pos + 2..].trim())?;

        Some(if negated {
            Condition::NotEq { step, field, literal }
        } else {
            Condition::Eq { step, field, literal }
        })
    }

    /// Whether the expression matched one of the supported forms
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Condition::Unrecognized(_))
    }

    /// Evaluate against the live context
    pub fn evaluate(&self, context: &PipelineContext) -> bool {
        match self {
            Condition::Truthy { step } => context.get_step_output(step).is_some_and(is_truthy),
            Condition::Eq { step, field, literal } => {
                field_text(context, step, field).as_deref() == Some(literal.as_str())
            }
            Condition::NotEq { step, field, literal } => {
                field_text(context, step, field).as_deref() != Some(literal.as_str())
            }
            Condition::Unrecognized(expr) => {
                warn!(condition = %expr, "Unrecognized condition, allowing step to run");
                true
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Truthy { step } => write!(f, "context.{}", step),
            Condition::Eq { step, field, literal } => {
                write!(f, "context.{}.{} == \"{}\"", step, field, literal)
            }
            Condition::NotEq { step, field, literal } => {
                write!(f, "context.{}.{} != \"{}\"", step, field, literal)
            }
            Condition::Unrecognized(expr) => f.write_str(expr),
        }
    }
}

fn field_text(context: &PipelineContext, step: &str, field: &str) -> Option<String> {
    context.get_field(step, field).map(value_to_text)
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Split `context.<step>[.<field>]` into its parts
fn parse_reference(expr: &str) -> Option<(String, Option<String>)> {
    let path = expr.strip_prefix("context.")?;
    let mut segments = path.split('.');
    let step = segments.next().filter(|s| is_identifier(s))?;
    let field = match segments.next() {
        Some(field) if is_identifier(field) => Some(field.to_string()),
        Some(_) => return None,
        None => None,
    };
    if segments.next().is_some() {
        return None;
    }
    Some((step.to_string(), field))
}

fn parse_literal(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Some(raw[1..raw.len() - 1].to_string());
        }
    }
    if raw.contains(char::is_whitespace) {
        return None;
    }
    Some(raw.to_string())
}

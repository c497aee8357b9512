//! Argument validation against a [`ToolSpec`] parameter schema.

use super::entities::{Arguments, ParamType, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of validating an invocation's arguments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// `Validation failed: e1, e2`
    pub fn summary(&self) -> String {
        format!("Validation failed: {}", self.errors.join(", "))
    }
}

/// Check required parameters and declared primitive types.
///
/// A `null` value counts as missing. Arguments not declared in the schema
/// are passed through unchecked.
pub fn validate_arguments(spec: &ToolSpec, arguments: &Arguments) -> ValidationReport {
    let mut errors = Vec::new();

    for param in &spec.parameters {
        match arguments.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    errors.push(format!("Missing required parameter: {}", param.name));
                }
            }
            Some(value) => {
                if !param.param_type.accepts(value) {
                    errors.push(format!(
                        "Parameter '{}' should be {}, got {}",
                        param.name,
                        param.param_type,
                        ParamType::describe(value)
                    ));
                }
            }
        }
    }

    ValidationReport::from_errors(errors)
}

//! Structural JSON Schema validation.
//!
//! Type, required-property and enum checks are delegated to the `jsonschema`
//! crate. Errors come back addressed by instance path and are mapped onto the
//! syntax tree so diagnostics land on the offending node.
//!
//! - A schema that fails to compile disables structural checks for its family
//! - Documents with syntax errors are not validated structurally

use serde_json::Value;
use tower_lsp::lsp_types::Range;

use crate::json::JsonDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralError {
    pub message: String,
    /// JSON Pointer of the offending instance, e.g. `/tags/0`.
    pub instance_path: String,
    pub range: Range,
}

pub struct StructuralSchema {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for StructuralSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralSchema").finish_non_exhaustive()
    }
}

impl StructuralSchema {
    /// Returns `None` when the schema cannot be compiled.
    pub fn compile(schema: &Value) -> Option<StructuralSchema> {
        match jsonschema::validator_for(schema) {
            Ok(validator) => Some(StructuralSchema { validator }),
            Err(err) => {
                tracing::debug!("structural validation disabled: {}", err);
                None
            }
        }
    }

    pub fn validate(&self, document: &JsonDocument) -> Vec<StructuralError> {
        if !document.errors().is_empty() {
            return Vec::new();
        }
        let Some(instance) = document.root().map(|root| document.to_value(root)) else {
            return Vec::new();
        };

        self.validator
            .iter_errors(&instance)
            .map(|error| {
                let instance_path = error.instance_path.to_string();
                let range = document
                    .node_at_pointer(&instance_path)
                    .or(document.root())
                    .map(|node| document.node_range(node))
                    .unwrap_or_default();
                StructuralError {
                    message: error.to_string(),
                    instance_path,
                    range,
                }
            })
            .collect()
    }
}

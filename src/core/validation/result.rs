//! Validation outcome reported back to clients

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Struct-level errors reported by the `validator` derive live under this key
const STRUCT_LEVEL_KEY: &str = "__all__";

/// Errors collected while validating an entity
///
/// An empty result means the entity is valid. A result with errors turns
/// into a `{"success": false, "field_errors": ..., "general_errors": ...}`
/// response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    field_errors: BTreeMap<String, Vec<String>>,
    general_errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_general_error(&mut self, message: impl Into<String>) {
        self.general_errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.general_errors.is_empty()
    }

    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field_errors
    }

    /// Messages for a single field, empty when the field is valid
    pub fn errors_for(&self, field: &str) -> &[String] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn general_errors(&self) -> &[String] {
        &self.general_errors
    }

    /// Append every error of `other` to this result
    pub fn merge(&mut self, other: ValidationResult) {
        for (field, messages) in other.field_errors {
            self.field_errors.entry(field).or_default().extend(messages);
        }
        self.general_errors.extend(other.general_errors);
    }

    /// Response fragment merged into `{"success": false}`
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("field_errors".to_string(), json!(self.field_errors));
        map.insert("general_errors".to_string(), json!(self.general_errors));
        map
    }
}

impl From<validator::ValidationErrors> for ValidationResult {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut result = ValidationResult::new();

        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            for error in field_errors.iter() {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("'{}' is invalid ({})", field, error.code),
                };

                if field == STRUCT_LEVEL_KEY {
                    result.add_general_error(message);
                } else {
                    result.add_field_error(field.clone(), message);
                }
            }
        }

        result
    }
}

// src/data/validation.rs
use crate::data::frame::{Frame, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns a dataset is expected to carry.
#[derive(Debug, Clone)]
pub struct DatasetSchema<'a> {
    pub target_column: &'a str,
    pub id_column: &'a str,
    pub required_columns: &'a [String],
    pub categorical_columns: &'a [String],
}

/// Validate a complete dataset against its schema
pub fn validate_frame(frame: &Frame, schema: &DatasetSchema<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();

    if frame.n_rows() == 0 {
        result.add_error("Dataset has no rows");
    }

    validate_target(frame, schema.target_column, &mut result);
    validate_required_columns(frame, schema, &mut result);
    validate_categorical_columns(frame, schema, &mut result);

    result
}

fn validate_target(frame: &Frame, target: &str, result: &mut ValidationResult) {
    let Some(column) = frame.column(target) else {
        result.add_error(format!("Target column {} is missing", target));
        return;
    };

    let bad = column
        .values
        .iter()
        .filter(|v| !matches!(v, Value::Int(0) | Value::Int(1) | Value::Bool(_)))
        .count();
    if bad > 0 {
        result.add_error(format!("Target column {} has {} non-binary values", target, bad));
    }
}

fn validate_required_columns(frame: &Frame, schema: &DatasetSchema<'_>, result: &mut ValidationResult) {
    for required in schema.required_columns {
        if !frame.contains(required) {
            result.add_error(format!("Required column {} is missing", required));
        }
    }

    let known: HashSet<&str> = schema
        .required_columns
        .iter()
        .map(String::as_str)
        .chain([schema.target_column, schema.id_column])
        .collect();

    for name in frame.column_names() {
        if !known.contains(name) {
            result.add_warning(format!("Column {} is not part of the schema", name));
        }
    }
}

fn validate_categorical_columns(frame: &Frame, schema: &DatasetSchema<'_>, result: &mut ValidationResult) {
    for name in schema.categorical_columns {
        if let Some(column) = frame.column(name) {
            if !column.is_categorical() {
                result.add_warning(format!("Column {} is declared categorical but holds no text values", name));
            }
            if column.values.iter().any(|v| matches!(v, Value::Missing)) {
                result.add_warning(format!("Categorical column {} has missing values", name));
            }
        }
    }
}

/// Result of dataset validation containing errors and warnings
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a new validation result
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error message
    pub fn add_error<S: Into<String>>(&mut self, message: S) {
        self.errors.push(message.into());
    }

    /// Add a warning message
    pub fn add_warning<S: Into<String>>(&mut self, message: S) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get a summary of validation issues
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        if self.has_errors() {
            summary.push_str(&format!("Errors ({}):\n", self.errors.len()));
            for (i, error) in self.errors.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, error));
            }
        }

        if self.has_warnings() {
            if !summary.is_empty() {
                summary.push('\n');
            }
            summary.push_str(&format!("Warnings ({}):\n", self.warnings.len()));
            for (i, warning) in self.warnings.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, warning));
            }
        }

        if summary.is_empty() {
            summary.push_str("Dataset validation passed without issues.");
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Column;

    fn schema<'a>(required: &'a [String], categorical: &'a [String]) -> DatasetSchema<'a> {
        DatasetSchema {
            target_column: "Response",
            id_column: "_id",
            required_columns: required,
            categorical_columns: categorical,
        }
    }

    #[test]
    fn test_valid_frame_passes() {
        let frame = Frame::new(vec![
            Column::new("_id", vec![Value::Text("a".into())]),
            Column::new("Gender", vec![Value::Text("Male".into())]),
            Column::new("Response", vec![Value::Int(1)]),
        ])
        .unwrap();
        let required = vec!["Gender".to_string()];

        let result = validate_frame(&frame, &schema(&required, &required));
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_missing_columns_and_bad_target() {
        let frame = Frame::new(vec![
            Column::new("Extra", vec![Value::Int(3)]),
            Column::new("Gender", vec![Value::Int(1)]),
            Column::new("Response", vec![Value::Int(7)]),
        ])
        .unwrap();
        let required = vec!["Gender".to_string(), "Age".to_string()];
        let categorical = vec!["Gender".to_string()];

        let result = validate_frame(&frame, &schema(&required, &categorical));
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.summary().contains("Required column Age is missing"));
    }
}

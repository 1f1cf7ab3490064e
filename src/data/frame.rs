// src/data/frame.rs
use crate::error::{PipelineError, Result};
use std::fmt;

/// A single cell of a tabular dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric view of the cell. Text has none; a missing cell is `NaN`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Text(_) => None,
            Value::Missing => Some(f64::NAN),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, ""),
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column is categorical as soon as it holds any text value.
    pub fn is_categorical(&self) -> bool {
        self.values.iter().any(|v| matches!(v, Value::Text(_)))
    }
}

/// Column-major table. Each row of the table is one Row of the dataset,
/// keyed by the column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.values.len() != n_rows) {
            return Err(PipelineError::schema(
                &bad.name,
                format!("has {} rows, expected {}", bad.values.len(), n_rows),
            ));
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Remove a column, returning it if it was present.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Rename a column in place. Returns false when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_mut(from) {
            Some(column) => {
                column.name = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(vec![
            Column::new("a", vec![Value::Int(1), Value::Int(2)]),
            Column::new("b", vec![Value::Text("x".into()), Value::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Frame::new(vec![
            Column::new("a", vec![Value::Int(1)]),
            Column::new("b", vec![Value::Int(1), Value::Int(2)]),
        ])
        .unwrap_err();

        assert!(matches!(err, PipelineError::SchemaMismatch { ref column, .. } if column == "b"));
    }

    #[test]
    fn test_drop_and_rename() {
        let mut frame = sample();
        assert!(frame.rename_column("a", "c"));
        assert!(!frame.rename_column("zzz", "y"));
        assert_eq!(frame.column_names(), vec!["c", "b"]);

        let dropped = frame.drop_column("b").unwrap();
        assert!(dropped.is_categorical());
        assert_eq!(frame.column_names(), vec!["c"]);
        assert!(frame.drop_column("b").is_none());
    }
}

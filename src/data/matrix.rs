// src/data/matrix.rs
use crate::error::{PipelineError, Result};

/// Fixed-width numeric encoding of a batch of rows.
///
/// `columns` names each position of every row; the order is the exact order
/// a fitted preprocessor expects.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(PipelineError::Inference {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Values of one feature across all rows.
    pub fn feature(&self, idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[idx])
    }
}

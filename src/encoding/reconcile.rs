// src/encoding/reconcile.rs
use crate::data::frame::Column;
use crate::data::matrix::FeatureMatrix;
use crate::encoding::encoder::EncodedFrame;
use crate::error::{PipelineError, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

impl EncodedFrame {
    /// Numeric matrix in the order the encoder produced the columns.
    pub fn to_matrix(&self) -> Result<FeatureMatrix> {
        let names: Vec<String> = self.frame.column_names().into_iter().map(String::from).collect();
        self.reconcile(&names)
    }

    /// Lay the encoded data out exactly as `expected` lists it.
    ///
    /// An expected column the encoder did not produce is rebuilt when it is
    /// an indicator of exactly one expanded categorical column (directly, or
    /// through a canonical rename). Its values come from that column, so a
    /// category this slice used as its reference keeps its real 0/1 values
    /// and a category it never saw is all zeros. Anything else is a schema
    /// mismatch. Produced columns the model does not know are dropped.
    pub fn reconcile(&self, expected: &[String]) -> Result<FeatureMatrix> {
        let n_rows = self.frame.n_rows();
        let mut by_column: Vec<Vec<f64>> = Vec::with_capacity(expected.len());

        for name in expected {
            match self.frame.column(name) {
                Some(column) => {
                    let values = column
                        .values
                        .iter()
                        .enumerate()
                        .map(|(row, v)| {
                            v.as_f64().ok_or_else(|| {
                                PipelineError::schema(name, format!("non-numeric value {:?} at row {}", v, row))
                            })
                        })
                        .collect::<Result<Vec<f64>>>()?;
                    by_column.push(values);
                }
                None => by_column.push(self.synthesize_indicator(name)?),
            }
        }

        let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
        for name in self.frame.column_names() {
            if !wanted.contains(name) {
                warn!("Dropping column {} which the model does not expect", name);
            }
        }

        let rows = (0..n_rows)
            .map(|r| by_column.iter().map(|c| c[r]).collect())
            .collect();
        FeatureMatrix::new(expected.to_vec(), rows)
    }

    fn synthesize_indicator(&self, name: &str) -> Result<Vec<f64>> {
        let generated = self
            .canonical_origins
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);

        let sources: Vec<&Column> = self
            .sources
            .iter()
            .filter(|source| {
                generated.len() > source.name.len() + 1 && generated.starts_with(&format!("{}_", source.name))
            })
            .collect();

        match sources.as_slice() {
            [source] => {
                let category = &generated[source.name.len() + 1..];
                debug!("Rebuilding indicator {} from {} == {:?}", name, source.name, category);
                Ok(source
                    .values
                    .iter()
                    .map(|v| if v.as_text() == Some(category) { 1.0 } else { 0.0 })
                    .collect())
            }
            [] => Err(PipelineError::schema(
                name,
                "expected by the model but not produced by the encoder",
            )),
            _ => Err(PipelineError::schema(
                name,
                format!(
                    "indicator could belong to any of {:?}",
                    sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
                ),
            )),
        }
    }
}

// src/encoding/encoder.rs
use crate::data::frame::{Column, Frame, Value};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Which columns the encoder touches and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Two-valued categorical column mapped through `binary_mapping`.
    pub binary_column: String,
    pub binary_mapping: BTreeMap<String, i64>,
    /// Identifier column dropped before one-hot expansion.
    pub id_column: String,
    /// Generated indicator name -> canonical name.
    pub renames: BTreeMap<String, String>,
    /// Indicator columns cast to integers after renaming.
    pub integer_columns: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary_column: "Gender".to_string(),
            binary_mapping: BTreeMap::from([("Female".to_string(), 0), ("Male".to_string(), 1)]),
            id_column: "_id".to_string(),
            renames: BTreeMap::from([
                ("Vehicle_Age_< 1 Year".to_string(), "Vehicle_Age_lt_1_Year".to_string()),
                ("Vehicle_Age_> 2 Years".to_string(), "Vehicle_Age_gt_2_Years".to_string()),
            ]),
            integer_columns: vec![
                "Vehicle_Age_lt_1_Year".to_string(),
                "Vehicle_Age_gt_2_Years".to_string(),
                "Vehicle_Damage_Yes".to_string(),
            ],
        }
    }
}

/// Output of [`FeatureEncoder::encode`].
///
/// Besides the encoded frame it keeps the categorical columns that were
/// expanded, so an indicator this slice did not emit (its reference
/// category, or a category it never saw) can be rebuilt from the raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    pub(crate) frame: Frame,
    pub(crate) sources: Vec<Column>,
    /// Canonical indicator name -> name the expansion generates.
    pub(crate) canonical_origins: BTreeMap<String, String>,
}

impl EncodedFrame {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Names of the categorical columns that were expanded.
    pub fn indicator_sources(&self) -> Vec<&str> {
        self.sources.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Deterministic transform from raw rows to the numeric layout a model expects.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    config: EncoderConfig,
}

impl FeatureEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Run the four encoding steps in order. Later steps rename columns
    /// produced by earlier ones, so the order is fixed.
    #[instrument(skip_all, fields(rows = frame.n_rows()))]
    pub fn encode(&self, frame: &Frame) -> Result<EncodedFrame> {
        let mut frame = frame.clone();

        self.map_binary_column(&mut frame)?;
        self.drop_id_column(&mut frame);
        let (mut frame, sources) = one_hot_drop_first(frame)?;
        self.rename_columns(&mut frame);

        debug!("Encoded columns: {:?}", frame.column_names());

        Ok(EncodedFrame {
            frame,
            sources,
            canonical_origins: self
                .config
                .renames
                .iter()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect(),
        })
    }

    fn map_binary_column(&self, frame: &mut Frame) -> Result<()> {
        debug!("Mapping {} column to binary values", self.config.binary_column);

        let name = self.config.binary_column.clone();
        let mapping = &self.config.binary_mapping;
        let column = frame
            .column_mut(&name)
            .ok_or_else(|| PipelineError::schema(&name, "binary column is absent"))?;

        for (row, value) in column.values.iter_mut().enumerate() {
            let mapped = match value {
                Value::Text(s) => mapping.get(s.as_str()).copied(),
                // already mapped, keeps encode idempotent
                Value::Int(v) if mapping.values().any(|m| *m == *v) => Some(*v),
                _ => None,
            };

            match mapped {
                Some(v) => *value = Value::Int(v),
                None => {
                    return Err(PipelineError::Encoding {
                        column: name,
                        row,
                        value: value.to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    fn drop_id_column(&self, frame: &mut Frame) {
        if frame.drop_column(&self.config.id_column).is_some() {
            debug!("Dropped identifier column {}", self.config.id_column);
        }
    }

    fn rename_columns(&self, frame: &mut Frame) {
        for (from, to) in &self.config.renames {
            if frame.rename_column(from, to) {
                debug!("Renamed {} to {}", from, to);
            }
        }

        for name in &self.config.integer_columns {
            if let Some(column) = frame.column_mut(name) {
                for value in column.values.iter_mut() {
                    if let Value::Bool(b) = value {
                        *value = Value::Int(i64::from(*b));
                    }
                }
            }
        }
    }
}

/// Expand every categorical column into indicators for all but its first
/// (sorted) category. Non-categorical columns keep their order and the
/// indicators follow them, grouped by source column. The expanded source
/// columns are returned alongside.
fn one_hot_drop_first(frame: Frame) -> Result<(Frame, Vec<Column>)> {
    let mut plain = Vec::new();
    let mut indicators = Vec::new();
    let mut sources = Vec::new();

    for column in frame.into_columns() {
        if !column.is_categorical() {
            plain.push(column);
            continue;
        }

        let categories: BTreeSet<&str> = column.values.iter().filter_map(Value::as_text).collect();
        for category in categories.iter().skip(1) {
            let values = column
                .values
                .iter()
                .map(|v| Value::Bool(v.as_text() == Some(*category)))
                .collect();
            indicators.push(Column::new(format!("{}_{}", column.name, category), values));
        }
        sources.push(column);
    }

    plain.extend(indicators);
    Ok((Frame::new(plain)?, sources))
}

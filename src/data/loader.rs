// src/data/loader.rs
use crate::data::frame::{Column, Frame, Value};
use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Feature rows together with the binary target split off them.
#[derive(Debug, Clone)]
pub struct LabeledFrame {
    pub features: Frame,
    pub labels: Vec<u8>,
}

impl LabeledFrame {
    /// Read a dataset and separate the target column from the features.
    pub fn load(path: &Path, target_column: &str) -> Result<Self> {
        let frame = read_csv(path)?;
        Self::split(frame, target_column, path)
    }

    /// Split an in-memory frame. `source` is only used for error context.
    pub fn split(mut frame: Frame, target_column: &str, source: &Path) -> Result<Self> {
        let target = frame.drop_column(target_column).ok_or_else(|| {
            PipelineError::data_load(source, format!("target column '{}' is absent", target_column))
        })?;

        let labels = target
            .values
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Int(0) | Value::Bool(false) => Ok(0),
                Value::Int(1) | Value::Bool(true) => Ok(1),
                other => Err(PipelineError::data_load(
                    source,
                    format!("target '{}' has non-binary value {:?} at row {}", target_column, other, row),
                )),
            })
            .collect::<Result<Vec<u8>>>()?;

        Ok(Self {
            features: frame,
            labels,
        })
    }
}

/// Read a CSV file wholesale into a frame, inferring one type per column.
pub fn read_csv(path: &Path) -> Result<Frame> {
    info!("Reading dataset from {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| PipelineError::data_load(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::data_load(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::data_load(path, format!("row {}: {}", row_idx + 1, e)))?;
        for (col_idx, field) in record.iter().enumerate() {
            raw[col_idx].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();

    let frame = Frame::new(columns).map_err(|e| PipelineError::data_load(path, e))?;
    debug!("Loaded {} rows x {} columns from {}", frame.n_rows(), frame.columns().len(), path.display());
    Ok(frame)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Pick the narrowest type every non-empty cell parses as.
fn infer_column(name: String, cells: Vec<String>) -> Column {
    let present = || cells.iter().map(|c| c.trim()).filter(|c| !c.is_empty());

    let convert = |parse: &dyn Fn(&str) -> Value| -> Vec<Value> {
        cells
            .iter()
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    Value::Missing
                } else {
                    parse(c)
                }
            })
            .collect()
    };

    let values = if present().all(|c| c.parse::<i64>().is_ok()) {
        convert(&|c| c.parse().map(Value::Int).unwrap_or(Value::Missing))
    } else if present().all(|c| c.parse::<f64>().is_ok()) {
        convert(&|c| c.parse().map(Value::Float).unwrap_or(Value::Missing))
    } else if present().all(|c| parse_bool(c).is_some()) {
        convert(&|c| parse_bool(c).map(Value::Bool).unwrap_or(Value::Missing))
    } else {
        convert(&|c| Value::Text(c.to_string()))
    };

    Column::new(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_csv_infers_column_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "id,Age,Premium,Flag,Vehicle_Age,Response\n\
             a1,44,2630.5,True,> 2 Years,1\n\
             a2,,3000,false,< 1 Year,0\n",
        )
        .unwrap();

        let frame = read_csv(&path).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.column("Age").unwrap().values, vec![Value::Int(44), Value::Missing]);
        assert_eq!(
            frame.column("Premium").unwrap().values,
            vec![Value::Float(2630.5), Value::Float(3000.0)]
        );
        assert_eq!(frame.column("Flag").unwrap().values, vec![Value::Bool(true), Value::Bool(false)]);
        assert!(frame.column("Vehicle_Age").unwrap().is_categorical());
        assert!(!frame.column("Age").unwrap().is_categorical());
    }

    #[test]
    fn test_load_splits_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "Age,Response\n20,0\n30,1\n40,1\n").unwrap();

        let data = LabeledFrame::load(&path, "Response").unwrap();
        assert_eq!(data.labels, vec![0, 1, 1]);
        assert_eq!(data.features.column_names(), vec!["Age"]);
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let dir = tempdir().unwrap();
        let err = LabeledFrame::load(&dir.path().join("nope.csv"), "Response").unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn test_missing_target_is_data_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "Age,Label\n20,0\n").unwrap();

        let err = LabeledFrame::load(&path, "Response").unwrap_err();
        match err {
            PipelineError::DataLoad { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("Response"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_binary_target_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "Age,Response\n20,0\n30,2\n").unwrap();

        assert!(matches!(
            LabeledFrame::load(&path, "Response"),
            Err(PipelineError::DataLoad { .. })
        ));
    }
}

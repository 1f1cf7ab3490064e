// src/pipeline/validation.rs
use crate::config::DataSettings;
use crate::data::loader::read_csv;
use crate::data::validation::{validate_frame, DatasetSchema, ValidationResult};
use crate::error::Result;
use crate::pipeline::artifacts::DataValidationArtifact;
use crate::utils::utils::write_json;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    validation_status: bool,
    train: &'a ValidationResult,
    test: &'a ValidationResult,
}

/// Checks the train and test datasets before anything is fit on them.
pub struct DataValidation<'a> {
    data: &'a DataSettings,
    id_column: &'a str,
    report_file_path: PathBuf,
}

impl<'a> DataValidation<'a> {
    pub fn new(data: &'a DataSettings, id_column: &'a str, report_file_path: PathBuf) -> Self {
        Self {
            data,
            id_column,
            report_file_path,
        }
    }

    fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        let frame = read_csv(path)?;
        let schema = DatasetSchema {
            target_column: &self.data.target_column,
            id_column: self.id_column,
            required_columns: &self.data.required_columns,
            categorical_columns: &self.data.categorical_columns,
        };
        let result = validate_frame(&frame, &schema);

        for warning in &result.warnings {
            warn!("{}: {}", path.display(), warning);
        }
        Ok(result)
    }

    /// Validate both datasets and write a JSON report. A dataset with errors
    /// yields a failed status rather than an `Err`; unreadable files do fail.
    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        info!("Starting data validation");

        let train = self.validate_file(&self.data.train_file_path)?;
        let test = self.validate_file(&self.data.test_file_path)?;
        let validation_status = !train.has_errors() && !test.has_errors();

        let message = format!(
            "train: {}\ntest: {}",
            train.summary().trim_end(),
            test.summary().trim_end()
        );

        write_json(
            &self.report_file_path,
            &ValidationReport {
                validation_status,
                train: &train,
                test: &test,
            },
        )?;

        info!("Data validation finished, status: {}", validation_status);

        Ok(DataValidationArtifact {
            validation_status,
            message,
            report_file_path: self.report_file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_report_is_written_and_status_reflects_errors() {
        let dir = tempdir().unwrap();
        let train = dir.path().join("train.csv");
        let test = dir.path().join("test.csv");
        fs::write(&train, "_id,Gender,Response\na,Male,1\nb,Female,0\n").unwrap();
        fs::write(&test, "_id,Gender\na,Male\n").unwrap();

        let data = DataSettings {
            train_file_path: train,
            test_file_path: test,
            required_columns: vec!["Gender".into()],
            categorical_columns: vec!["Gender".into()],
            ..DataSettings::default()
        };
        let report = dir.path().join("validation").join("report.json");

        let artifact = DataValidation::new(&data, "_id", report.clone())
            .initiate_data_validation()
            .unwrap();

        assert!(!artifact.validation_status);
        assert!(artifact.message.contains("Target column Response is missing"));
        assert!(report.exists());
    }
}

// src/config.rs
use crate::encoding::EncoderConfig;
use crate::error::Result;
use crate::model::LogisticRegressionParams;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "pipeline";

/// Snapshot of every setting the pipeline reads.
///
/// Layered as: built-in defaults, then an optional config file, then
/// `PIPELINE_*` environment variables (`__` separates nested keys, e.g.
/// `PIPELINE_REGISTRY__BACKEND=redis`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub artifact_dir: PathBuf,
    pub log_dir: PathBuf,
    pub data: DataSettings,
    pub encoding: EncoderConfig,
    pub training: TrainingSettings,
    pub registry: RegistrySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifact"),
            log_dir: PathBuf::from("logs"),
            data: DataSettings::default(),
            encoding: EncoderConfig::default(),
            training: TrainingSettings::default(),
            registry: RegistrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub train_file_path: PathBuf,
    pub test_file_path: PathBuf,
    pub target_column: String,
    pub required_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        let strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            train_file_path: PathBuf::from("data/train.csv"),
            test_file_path: PathBuf::from("data/test.csv"),
            target_column: "Response".to_string(),
            required_columns: strings(&[
                "Gender",
                "Age",
                "Driving_License",
                "Region_Code",
                "Previously_Insured",
                "Vehicle_Age",
                "Vehicle_Damage",
                "Annual_Premium",
                "Policy_Sales_Channel",
                "Vintage",
            ]),
            categorical_columns: strings(&["Gender", "Vehicle_Age", "Vehicle_Damage"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Minimum F1 on the test set for a trained model to be kept at all.
    pub expected_score: f64,
    pub standard_columns: Vec<String>,
    pub minmax_columns: Vec<String>,
    pub model_file_name: String,
    pub classifier: LogisticRegressionParams,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            expected_score: 0.6,
            standard_columns: vec!["Age".to_string(), "Vintage".to_string()],
            minmax_columns: vec!["Annual_Premium".to_string()],
            model_file_name: "model.bin".to_string(),
            classifier: LogisticRegressionParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    Fs,
    Redis,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub backend: RegistryBackend,
    /// Root directory for the `fs` backend.
    pub root: PathBuf,
    /// Connection URL (with credentials) for `redis` and `postgres`.
    pub url: Option<String>,
    pub key_prefix: String,
    /// Key of the production model slot.
    pub model_key: String,
    pub max_connections: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::Fs,
            root: PathBuf::from("model-registry"),
            url: None,
            key_prefix: "models:".to_string(),
            model_key: "production/model.bin".to_string(),
            max_connections: 4,
        }
    }
}

impl Settings {
    /// Load settings from `path` (or `pipeline.{toml,yaml,json}` when absent)
    /// and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PIPELINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.apply_url_fallback();
        Ok(settings)
    }

    /// Fall back to the conventional `DATABASE_URL` / `REDIS_URL` variables
    fn apply_url_fallback(&mut self) {
        if self.registry.url.is_some() {
            return;
        }
        let var = match self.registry.backend {
            RegistryBackend::Fs => return,
            RegistryBackend::Redis => "REDIS_URL",
            RegistryBackend::Postgres => "DATABASE_URL",
        };
        self.registry.url = std::env::var(var).ok();
    }

    /// File name of the trained model inside a run's trainer directory.
    pub fn model_path_in(&self, run_dir: &Path) -> PathBuf {
        run_dir
            .join("model_trainer")
            .join("trained_model")
            .join(&self.training.model_file_name)
    }
}

// src/model/mod.rs
pub mod classifier;
pub mod estimator;
pub mod metrics;
pub mod preprocess;

pub use classifier::{LogisticRegression, LogisticRegressionParams};
pub use estimator::TrainedModel;
pub use metrics::{f1_score, ClassificationMetrics};
pub use preprocess::{Preprocessor, Scaling};

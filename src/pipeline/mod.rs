// src/pipeline/mod.rs
pub mod artifacts;
pub mod evaluation;
pub mod prediction;
pub mod pusher;
pub mod trainer;
pub mod training_pipeline;
pub mod validation;

pub use artifacts::{DataValidationArtifact, ModelEvaluationArtifact, ModelPusherArtifact, ModelTrainerArtifact};
pub use evaluation::{EvaluationConfig, EvaluationResult, ModelEvaluator};
pub use prediction::PredictionPipeline;
pub use pusher::ModelPusher;
pub use trainer::ModelTrainer;
pub use training_pipeline::{PipelineOutcome, TrainingPipeline};
pub use validation::DataValidation;

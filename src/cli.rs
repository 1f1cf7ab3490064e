// src/cli.rs
use crate::config::Settings;
use crate::data::loader::LabeledFrame;
use crate::encoding::FeatureEncoder;
use crate::model::TrainedModel;
use crate::pipeline::{
    DataValidation, EvaluationConfig, ModelEvaluationArtifact, ModelEvaluator, ModelPusher, ModelTrainer,
    ModelTrainerArtifact, PredictionPipeline, TrainingPipeline,
};
use crate::registry::{self, ModelHandle};
use crate::utils::utils::{run_timestamp, write_json};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "model-pipeline")]
#[command(about = "Train, evaluate and promote classification models", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./pipeline.{toml,yaml,json} when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run validation, training, evaluation and promotion end to end
    Run,

    /// Validate the datasets and train a candidate without evaluating it
    Train {
        /// Where to write the trained model
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare a trained candidate against the production model
    Evaluate {
        /// Candidate model artifact
        #[arg(short, long)]
        candidate: PathBuf,

        /// Export the decision to this JSON file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Promote a candidate according to a decision file written by `evaluate`
    Push {
        /// Decision JSON file
        #[arg(short, long)]
        decision: PathBuf,

        /// Delete the local candidate once the upload succeeded
        #[arg(long)]
        remove_local: bool,
    },

    /// Show whether a production model is present
    Status,

    /// Score a CSV file with the production model
    Predict {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,
    },
}

/// Execute a command from the CLI
pub async fn execute_command(command: Commands, settings: Settings) -> Result<()> {
    // Each command opens its own registry client and drops it on return
    let store = registry::connect(&settings.registry)
        .await
        .context("Failed to connect to the model registry")?;

    match command {
        Commands::Run => {
            let pipeline = TrainingPipeline::new(settings, store);
            let outcome = pipeline.run_pipeline().await?;

            println!("Run directory: {}", outcome.run_dir.display());
            println!("Trained model F1: {:.4}", outcome.trainer.metric_artifact.f1_score);
            println!("Score delta: {:+.4}", outcome.evaluation.score_delta);
            match outcome.pusher {
                Some(pushed) => println!("Accepted, pushed to {}://{}", pushed.backend, pushed.remote_model_path),
                None => println!("Rejected, production model unchanged"),
            }
        }

        Commands::Train { output } => {
            let run_dir = settings.artifact_dir.join(run_timestamp());
            let report = run_dir.join("data_validation").join("report.json");
            let validation = DataValidation::new(&settings.data, &settings.encoding.id_column, report)
                .initiate_data_validation()
                .context("Data validation failed")?;
            println!("{}", validation.message);
            if !validation.validation_status {
                return Err(anyhow::anyhow!("Dataset validation failed, see {}", validation.report_file_path.display()));
            }

            let model_path = output.unwrap_or_else(|| settings.model_path_in(&run_dir));
            let encoder = FeatureEncoder::new(settings.encoding.clone());
            let artifact = ModelTrainer::new(&settings.data, &settings.training, &encoder, model_path)
                .initiate_model_trainer()
                .context("Model training failed")?;

            let metrics = &artifact.metric_artifact;
            println!("Trained model written to {}", artifact.trained_model_file_path.display());
            println!("F1: {:.4}", metrics.f1_score);
            println!("Precision: {:.4}", metrics.precision_score);
            println!("Recall: {:.4}", metrics.recall_score);
        }

        Commands::Evaluate { candidate, export } => {
            let encoder = FeatureEncoder::new(settings.encoding.clone());

            // Score the candidate on the test set to get the figure training would have reported
            let model = TrainedModel::load_from(&candidate).context("Failed to load candidate model")?;
            let test = LabeledFrame::load(&settings.data.test_file_path, &settings.data.target_column)?;
            let metric_artifact = ModelTrainer::new(&settings.data, &settings.training, &encoder, candidate.clone())
                .score(&model, &test)
                .context("Failed to score candidate model")?;
            let trainer_artifact = ModelTrainerArtifact {
                trained_model_file_path: candidate,
                metric_artifact,
            };

            let decision_file_path = export.unwrap_or_else(|| {
                settings
                    .artifact_dir
                    .join("model_evaluation")
                    .join("report.json")
            });
            let config = EvaluationConfig {
                test_file_path: settings.data.test_file_path.clone(),
                target_column: settings.data.target_column.clone(),
                remote_model_path: settings.registry.model_key.clone(),
                decision_file_path: decision_file_path.clone(),
            };
            let incumbent = ModelHandle::registry(store, settings.registry.model_key.clone());

            let evaluation = ModelEvaluator::new(config, &encoder, &trainer_artifact, &incumbent)
                .initiate_model_evaluation()
                .await
                .context("Model evaluation failed")?;

            println!("Accepted: {}", evaluation.is_accepted);
            println!("Score delta: {:+.4}", evaluation.score_delta);
            println!("Decision written to {}", decision_file_path.display());
        }

        Commands::Push { decision, remove_local } => {
            let json = std::fs::read_to_string(&decision)
                .with_context(|| format!("Failed to read decision file {}", decision.display()))?;
            let evaluation: ModelEvaluationArtifact = serde_json::from_str(&json)?;

            let mut production = ModelHandle::registry(store, evaluation.remote_model_path.clone());
            let pushed = ModelPusher::new(&mut production, remove_local)
                .initiate_model_pusher(&evaluation)
                .await
                .context("Model push failed")?;

            match pushed {
                Some(artifact) => {
                    println!("Pushed to {}://{}", artifact.backend, artifact.remote_model_path);
                    let report = decision.with_file_name("pusher.json");
                    write_json(&report, &artifact)?;
                }
                None => println!("Decision was a rejection, nothing pushed."),
            }
        }

        Commands::Status => {
            let production = ModelHandle::registry(store, settings.registry.model_key.clone());
            if production.is_present().await? {
                let model = production.load().await.context("Production model is present but unusable")?;
                println!("Production model: {}", production.location());
                println!("Expected features ({}):", model.expected_columns().len());
                for name in model.expected_columns() {
                    println!("  {}", name);
                }
            } else {
                println!("No production model at {}", production.location());
            }
        }

        Commands::Predict { input, output } => {
            let encoder = FeatureEncoder::new(settings.encoding.clone());
            let production = ModelHandle::registry(store, settings.registry.model_key.clone());

            let rows = PredictionPipeline::new(&encoder, &production)
                .predict_to_csv(&input, &output, &settings.data.target_column)
                .await
                .context("Prediction failed")?;
            println!("Wrote {} predictions to {}", rows, output.display());
        }
    }

    Ok(())
}

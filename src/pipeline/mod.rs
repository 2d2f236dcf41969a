//! The pipeline stages, in execution order.
//!
//! `run_training_pipeline` chains ingestion, transformation, and training
//! into the artifact set that `PredictPipeline` later serves from.

mod ingestion;
mod predict;
mod trainer;
mod transformation;

pub use ingestion::{DataIngestion, IngestionConfig};
pub use predict::{PredictConfig, PredictPipeline, StudentRecord};
pub use trainer::{
    default_catalog, Candidate, CandidateReport, ModelTrainer, TrainerConfig, TrainingReport,
};
pub use transformation::{DataTransformation, TransformationConfig, TransformationOutput};

use std::path::Path;

use crate::error::Result;

/// Run ingestion, transformation, and training end to end, leaving every
/// artifact under `artifacts_dir`.
pub fn run_training_pipeline(source: &Path, artifacts_dir: &Path) -> Result<TrainingReport> {
    let ingestion = DataIngestion::new(IngestionConfig::in_dir(artifacts_dir));
    let (train_path, test_path) = ingestion.run(source)?;

    let transformation = DataTransformation::new(TransformationConfig::in_dir(artifacts_dir));
    let output = transformation.run(&train_path, &test_path)?;

    let trainer = ModelTrainer::new(TrainerConfig::in_dir(artifacts_dir));
    trainer.run(&output.train, &output.test)
}

//! Scorecast - Students performance score prediction
//!
//! End-to-end pipeline for the students performance dataset:
//! - Data ingestion with a seeded train/test split
//! - Preprocessing: imputation, one-hot encoding, standardization
//! - Training with cross-validated grid search over a fixed model catalog
//! - JSON artifact persistence and single-record prediction
//!
//! # Modules
//!
//! - [`data`] - Dataset schema, CSV I/O, train/test splitting
//! - [`preprocessing`] - Imputation, encoding, scaling
//! - [`models`] - Regressors, cross-validation, metrics
//! - [`pipeline`] - Ingestion, transformation, training, prediction stages
//! - [`artifact`] - JSON persistence for fitted objects
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data handling
pub mod artifact;
pub mod data;

// Core ML modules
pub mod models;
pub mod preprocessing;

// Pipeline stages
pub mod pipeline;

// Services
pub mod cli;
pub mod logging;

pub use error::{Result, ScorecastError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ScorecastError};

    // Preprocessing
    pub use crate::preprocessing::{Imputer, OneHotEncoder, Preprocessor, Scaler};

    // Models
    pub use crate::models::{KFold, ModelKind, ParamSet, RegressionMetrics, TrainedRegressor};

    // Pipeline stages
    pub use crate::pipeline::{
        run_training_pipeline, DataIngestion, DataTransformation, ModelTrainer, PredictPipeline,
        StudentRecord, TrainingReport,
    };

    // Artifacts
    pub use crate::artifact::{load_artifact, save_artifact};
}

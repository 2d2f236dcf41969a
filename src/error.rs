//! Error types for the scorecast pipeline.

use std::panic::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type covering every pipeline stage.
///
/// Stage variants are built through the `#[track_caller]` constructors so the
/// message always carries the source location where the failure was wrapped.
#[derive(Error, Debug)]
pub enum ScorecastError {
    #[error("data ingestion failed at {location}: {message}")]
    Ingestion {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("data transformation failed at {location}: {message}")]
    Transformation {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("model training failed at {location}: {message}")]
    Training {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("prediction failed at {location}: {message}")]
    Prediction {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("unknown category {value:?} for column {column:?}")]
    UnknownCategory { column: String, value: String },

    #[error("value {value} for {field:?} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("artifact not found at {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("transformer or model used before fitting")]
    NotFitted,
}

impl ScorecastError {
    #[track_caller]
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn transformation(message: impl Into<String>) -> Self {
        Self::Transformation {
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn training(message: impl Into<String>) -> Self {
        Self::Training {
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction {
            message: message.into(),
            location: Location::caller(),
        }
    }
}

impl From<polars::error::PolarsError> for ScorecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScorecastError::Data(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScorecastError>;

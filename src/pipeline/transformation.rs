//! Data transformation stage: CSV partitions in, feature matrices out.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use tracing::info;

use crate::artifact::save_artifact;
use crate::data::loader::read_csv;
use crate::data::schema::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS, TARGET_COLUMN};
use crate::error::{Result, ScorecastError};
use crate::preprocessing::Preprocessor;

#[derive(Debug, Clone)]
pub struct TransformationConfig {
    pub preprocessor_path: PathBuf,
    pub target_column: String,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self::in_dir("artifacts")
    }
}

impl TransformationConfig {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            preprocessor_path: dir.as_ref().join("preprocessor.json"),
            target_column: TARGET_COLUMN.to_string(),
        }
    }
}

/// Dense matrices for the trainer, target appended as the last column,
/// plus where the fitted preprocessor was persisted.
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    pub train: Array2<f64>,
    pub test: Array2<f64>,
    pub preprocessor_path: PathBuf,
}

/// Second pipeline stage. Fits the preprocessor on the training partition
/// only, applies it to both partitions, and persists it for serving.
#[derive(Debug, Clone, Default)]
pub struct DataTransformation {
    config: TransformationConfig,
}

impl DataTransformation {
    pub fn new(config: TransformationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformationConfig {
        &self.config
    }

    pub fn run(&self, train_path: &Path, test_path: &Path) -> Result<TransformationOutput> {
        self.transform(train_path, test_path)
            .map_err(|e| ScorecastError::transformation(e.to_string()))
    }

    fn transform(&self, train_path: &Path, test_path: &Path) -> Result<TransformationOutput> {
        let train_df = read_csv(train_path)?;
        let test_df = read_csv(test_path)?;

        let y_train = target_vector(&train_df, &self.config.target_column)?;
        let y_test = target_vector(&test_df, &self.config.target_column)?;

        let x_train_df = train_df.drop(&self.config.target_column)?;
        let x_test_df = test_df.drop(&self.config.target_column)?;

        let mut preprocessor = Preprocessor::new(&NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS);
        preprocessor.fit(&x_train_df)?;
        info!(
            features = preprocessor.output_columns().len(),
            "fitted preprocessor on training partition"
        );

        let x_train = preprocessor.transform_matrix(&x_train_df)?;
        let x_test = preprocessor.transform_matrix(&x_test_df)?;

        save_artifact(&self.config.preprocessor_path, &preprocessor)?;
        info!(path = %self.config.preprocessor_path.display(), "saved preprocessor");

        Ok(TransformationOutput {
            train: with_target(x_train, &y_train)?,
            test: with_target(x_test, &y_test)?,
            preprocessor_path: self.config.preprocessor_path.clone(),
        })
    }
}

fn target_vector(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let series = df
        .column(name)
        .map_err(|_| ScorecastError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;

    let mut values = Vec::with_capacity(ca.len());
    for opt in ca.into_iter() {
        values.push(opt.ok_or_else(|| {
            ScorecastError::Data(format!("null target value in column {name:?}"))
        })?);
    }
    Ok(Array1::from_vec(values))
}

fn with_target(features: Array2<f64>, target: &Array1<f64>) -> Result<Array2<f64>> {
    if features.nrows() != target.len() {
        return Err(ScorecastError::ShapeMismatch {
            expected: features.nrows(),
            actual: target.len(),
        });
    }
    let target_col = target.view().insert_axis(Axis(1));
    ndarray::concatenate(Axis(1), &[features.view(), target_col])
        .map_err(|e| ScorecastError::Data(format!("cannot append target column: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::write_csv;

    fn partition_frame(reading: &[i64], lunch: &[&str]) -> DataFrame {
        let n = reading.len();
        DataFrame::new(vec![
            Column::new("gender".into(), vec!["female"; n]),
            Column::new("race/ethnicity".into(), vec!["group A"; n]),
            Column::new("parental level of education".into(), vec!["some college"; n]),
            Column::new("lunch".into(), lunch),
            Column::new("test preparation course".into(), vec!["none"; n]),
            Column::new("reading score".into(), reading),
            Column::new("writing score".into(), reading),
            Column::new("math score".into(), reading),
        ])
        .unwrap()
    }

    fn write_partitions(dir: &Path) -> (PathBuf, PathBuf) {
        let mut train = partition_frame(
            &[10, 20, 30, 40],
            &["standard", "free/reduced", "standard", "free/reduced"],
        );
        let mut test = partition_frame(&[40], &["standard"]);

        let train_path = dir.join("train.csv");
        let test_path = dir.join("test.csv");
        write_csv(&mut train, &train_path).unwrap();
        write_csv(&mut test, &test_path).unwrap();
        (train_path, test_path)
    }

    #[test]
    fn test_partitions_share_training_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (train_path, test_path) = write_partitions(dir.path());

        let stage = DataTransformation::new(TransformationConfig::in_dir(dir.path()));
        let output = stage.run(&train_path, &test_path).unwrap();

        assert_eq!(output.train.ncols(), output.test.ncols());
        assert_eq!(output.train.nrows(), 4);
        assert_eq!(output.test.nrows(), 1);
        assert!(output.preprocessor_path.exists());
    }

    #[test]
    fn test_statistics_come_from_train_only() {
        let dir = tempfile::tempdir().unwrap();
        let (train_path, test_path) = write_partitions(dir.path());

        let stage = DataTransformation::new(TransformationConfig::in_dir(dir.path()));
        let output = stage.run(&train_path, &test_path).unwrap();

        // Train reading scores are 10/20/30/40, sample std = sqrt(500/3).
        // The one test row (reading 40) must be scaled by that train std.
        let train_std = (500.0f64 / 3.0).sqrt();
        assert!((output.test[[0, 0]] - 40.0 / train_std).abs() < 1e-9);
    }

    #[test]
    fn test_target_is_last_column_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (train_path, test_path) = write_partitions(dir.path());

        let stage = DataTransformation::new(TransformationConfig::in_dir(dir.path()));
        let output = stage.run(&train_path, &test_path).unwrap();

        let last = output.train.ncols() - 1;
        let targets: Vec<f64> = output.train.column(last).to_vec();
        assert_eq!(targets, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_missing_target_is_stage_error() {
        let dir = tempfile::tempdir().unwrap();
        let (train_path, test_path) = write_partitions(dir.path());

        let config = TransformationConfig {
            preprocessor_path: dir.path().join("preprocessor.json"),
            target_column: "final grade".to_string(),
        };
        let err = DataTransformation::new(config)
            .run(&train_path, &test_path)
            .unwrap_err();
        assert!(err.to_string().contains("data transformation failed"));
    }
}

//! Stateless single-row inference against persisted artifacts.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::artifact::load_artifact;
use crate::data::schema::{self, SCORE_MAX, SCORE_MIN};
use crate::error::{Result, ScorecastError};
use crate::models::TrainedRegressor;
use crate::preprocessing::Preprocessor;

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub preprocessor_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self::in_dir("artifacts")
    }
}

impl PredictConfig {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            preprocessor_path: dir.as_ref().join("preprocessor.json"),
            model_path: dir.as_ref().join("model.json"),
        }
    }
}

/// One student, as submitted at the inference boundary.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub gender: String,
    pub ethnicity: String,
    pub parental_education: String,
    pub lunch: String,
    pub test_preparation: String,
    pub reading_score: u32,
    pub writing_score: u32,
}

impl StudentRecord {
    /// Check every field against the dataset schema before any encoding
    /// happens, so bad input fails with a field-level message instead of an
    /// encoder error.
    pub fn validate(&self) -> Result<()> {
        let categorical = [
            ("gender", self.gender.as_str()),
            ("race/ethnicity", self.ethnicity.as_str()),
            ("parental level of education", self.parental_education.as_str()),
            ("lunch", self.lunch.as_str()),
            ("test preparation course", self.test_preparation.as_str()),
        ];
        for (column, value) in categorical {
            let options = schema::options_for(column).unwrap_or(&[]);
            if !options.contains(&value) {
                return Err(ScorecastError::UnknownCategory {
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
        }

        check_score("reading score", self.reading_score)?;
        check_score("writing score", self.writing_score)?;
        Ok(())
    }

    /// A one-row frame with the exact training column names.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Column::new("gender".into(), vec![self.gender.clone()]),
            Column::new("race/ethnicity".into(), vec![self.ethnicity.clone()]),
            Column::new(
                "parental level of education".into(),
                vec![self.parental_education.clone()],
            ),
            Column::new("lunch".into(), vec![self.lunch.clone()]),
            Column::new(
                "test preparation course".into(),
                vec![self.test_preparation.clone()],
            ),
            Column::new("reading score".into(), &[self.reading_score as i64]),
            Column::new("writing score".into(), &[self.writing_score as i64]),
        ])?;
        Ok(df)
    }
}

fn check_score(field: &str, value: u32) -> Result<()> {
    let value = f64::from(value);
    if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(ScorecastError::OutOfRange {
            field: field.to_string(),
            value,
            min: SCORE_MIN,
            max: SCORE_MAX,
        });
    }
    Ok(())
}

/// Final pipeline stage: scores one student at a time.
///
/// Artifacts are reloaded on every call, so a retrain is picked up without
/// restarting the caller.
#[derive(Debug, Clone, Default)]
pub struct PredictPipeline {
    config: PredictConfig,
}

impl PredictPipeline {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictConfig {
        &self.config
    }

    /// Predicted math score for one student.
    pub fn predict(&self, record: &StudentRecord) -> Result<f64> {
        match self.score(record) {
            Err(e @ ScorecastError::Prediction { .. }) => Err(e),
            Err(e) => Err(ScorecastError::prediction(e.to_string())),
            ok => ok,
        }
    }

    fn score(&self, record: &StudentRecord) -> Result<f64> {
        record.validate()?;

        let preprocessor: Preprocessor = load_artifact(&self.config.preprocessor_path)?;
        let model: TrainedRegressor = load_artifact(&self.config.model_path)?;

        let frame = record.to_dataframe()?;
        let features = preprocessor.transform_matrix(&frame)?;
        let predictions = model.predict(&features)?;

        let Some(&score) = predictions.first() else {
            return Err(ScorecastError::Data(
                "model produced no output for the record".to_string(),
            ));
        };
        if !score.is_finite() {
            return Err(ScorecastError::Data(format!(
                "model produced a non-finite score: {score}"
            )));
        }

        info!(score, model = %model.kind(), "scored student record");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::save_artifact;
    use crate::data::schema::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
    use crate::models::{ModelKind, ParamSet};
    use ndarray::Array1;

    fn valid_record() -> StudentRecord {
        StudentRecord {
            gender: "female".to_string(),
            ethnicity: "group A".to_string(),
            parental_education: "some college".to_string(),
            lunch: "standard".to_string(),
            test_preparation: "none".to_string(),
            reading_score: 72,
            writing_score: 68,
        }
    }

    fn training_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("gender".into(), &["female", "male", "female", "male"]),
            Column::new(
                "race/ethnicity".into(),
                &["group A", "group B", "group A", "group B"],
            ),
            Column::new(
                "parental level of education".into(),
                &["some college", "some college", "some college", "some college"],
            ),
            Column::new(
                "lunch".into(),
                &["standard", "standard", "free/reduced", "free/reduced"],
            ),
            Column::new(
                "test preparation course".into(),
                &["none", "completed", "none", "completed"],
            ),
            Column::new("reading score".into(), &[60i64, 70, 80, 90]),
            Column::new("writing score".into(), &[55i64, 65, 75, 85]),
        ])
        .unwrap()
    }

    fn write_artifacts(dir: &Path) -> PredictConfig {
        let mut preprocessor = Preprocessor::new(&NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS);
        let frame = training_frame();
        preprocessor.fit(&frame).unwrap();
        let x = preprocessor.transform_matrix(&frame).unwrap();
        let y = Array1::from_vec(vec![58.0, 68.0, 78.0, 88.0]);

        let model = TrainedRegressor::fit(
            ModelKind::Ridge,
            &ParamSet::new().with_alpha(1.0),
            &x,
            &y,
            42,
        )
        .unwrap();

        let config = PredictConfig::in_dir(dir);
        save_artifact(&config.preprocessor_path, &preprocessor).unwrap();
        save_artifact(&config.model_path, &model).unwrap();
        config
    }

    #[test]
    fn test_predicts_from_saved_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictPipeline::new(write_artifacts(dir.path()));

        let score = pipeline.predict(&valid_record()).unwrap();
        assert!(score.is_finite());
        assert!((30.0..=110.0).contains(&score), "score was {score}");
    }

    #[test]
    fn test_missing_artifacts_fail_with_stage_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictPipeline::new(PredictConfig::in_dir(dir.path()));

        let err = pipeline.predict(&valid_record()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("prediction failed"));
        assert!(text.contains("artifact not found"));
    }

    #[test]
    fn test_unknown_category_is_rejected_before_artifacts_load() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictPipeline::new(PredictConfig::in_dir(dir.path()));

        let mut record = valid_record();
        record.lunch = "premium".to_string();
        let err = pipeline.predict(&record).unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }

    #[test]
    fn test_out_of_range_score_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictPipeline::new(PredictConfig::in_dir(dir.path()));

        let mut record = valid_record();
        record.reading_score = 150;
        let err = pipeline.predict(&record).unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_record_validation_covers_every_categorical_field() {
        let base = valid_record();
        let mutations: [(&str, Box<dyn Fn(&mut StudentRecord)>); 5] = [
            ("gender", Box::new(|r| r.gender = "unknown".to_string())),
            ("race/ethnicity", Box::new(|r| r.ethnicity = "group Z".to_string())),
            (
                "parental level of education",
                Box::new(|r| r.parental_education = "phd".to_string()),
            ),
            ("lunch", Box::new(|r| r.lunch = "none".to_string())),
            (
                "test preparation course",
                Box::new(|r| r.test_preparation = "partial".to_string()),
            ),
        ];

        for (column, mutate) in mutations {
            let mut record = base.clone();
            mutate(&mut record);
            let err = record.validate().unwrap_err();
            match err {
                ScorecastError::UnknownCategory { column: c, .. } => assert_eq!(c, column),
                other => panic!("expected UnknownCategory, got {other:?}"),
            }
        }
    }
}

//! Column-wise preprocessing pipeline.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ImputeStrategy, Imputer, OneHotEncoder, Scaler};
use crate::error::{Result, ScorecastError};

/// Two-branch preprocessor over a declared column layout.
///
/// Numeric branch: median imputation, then scale-only standardization.
/// Categorical branch: mode imputation, one-hot encoding, then the same
/// standardization over the indicator columns.
///
/// All statistics are learned in [`fit`](Self::fit) and never touched again;
/// [`transform`](Self::transform) takes `&self` so a fitted artifact stays
/// read-only for its whole serving life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    scaler: Scaler,
    is_fitted: bool,
}

impl Preprocessor {
    /// Preprocessor for the given column layout. Order is preserved into the
    /// output matrix: numeric columns first, then indicator columns.
    pub fn new(numeric_columns: &[&str], categorical_columns: &[&str]) -> Self {
        Self {
            numeric_columns: numeric_columns.iter().map(|s| s.to_string()).collect(),
            categorical_columns: categorical_columns.iter().map(|s| s.to_string()).collect(),
            numeric_imputer: Imputer::new(ImputeStrategy::Median),
            categorical_imputer: Imputer::new(ImputeStrategy::MostFrequent),
            encoder: OneHotEncoder::new(),
            scaler: Scaler::new(),
            is_fitted: false,
        }
    }

    /// Learn imputation statistics, encoding vocabulary, and scaling
    /// parameters from `df`. Call this on the training split only.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let numeric: Vec<&str> = self.numeric_columns.iter().map(|s| s.as_str()).collect();
        let categorical: Vec<&str> =
            self.categorical_columns.iter().map(|s| s.as_str()).collect();

        let work = self.numeric_imputer.fit_transform(df, &numeric)?;
        let work = self.categorical_imputer.fit_transform(&work, &categorical)?;
        let work = self.encoder.fit_transform(&work, &categorical)?;

        let mut scale_columns: Vec<String> = self.numeric_columns.clone();
        scale_columns.extend(self.encoder.output_columns());
        let scale_refs: Vec<&str> = scale_columns.iter().map(|s| s.as_str()).collect();
        self.scaler.fit(&work, &scale_refs)?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted stages in order. Errors if any declared column is
    /// missing or a categorical value was never seen at fit time.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let work = self.numeric_imputer.transform(df)?;
        let work = self.categorical_imputer.transform(&work)?;
        let work = self.encoder.transform(&work)?;
        self.scaler.transform(&work)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Feature column names of the output matrix, in matrix order.
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = self.numeric_columns.clone();
        columns.extend(self.encoder.output_columns());
        columns
    }

    /// Transform `df` and lay the declared feature columns out as a dense
    /// row-major matrix.
    pub fn transform_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let transformed = self.transform(df)?;
        columns_to_array2(&transformed, &self.output_columns())
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }
}

/// Gather named columns into a row-major `Array2<f64>`.
pub(crate) fn columns_to_array2(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();

    let mut column_values: Vec<Vec<f64>> = Vec::with_capacity(n_cols);
    for col_name in columns {
        let series = df
            .column(col_name)
            .map_err(|_| ScorecastError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = series.f64()?;
        let mut values = Vec::with_capacity(n_rows);
        for opt in ca.into_iter() {
            values.push(opt.ok_or_else(|| {
                ScorecastError::Data(format!("unexpected null in column {col_name:?}"))
            })?);
        }
        column_values.push(values);
    }

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        column_values[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("reading score".into(), &[Some(60i64), Some(70), None, Some(90)]),
            Column::new("writing score".into(), &[55i64, 65, 75, 85]),
            Column::new(
                "lunch".into(),
                &[Some("standard"), None, Some("free/reduced"), Some("standard")],
            ),
        ])
        .unwrap()
    }

    fn layout() -> Preprocessor {
        Preprocessor::new(&["reading score", "writing score"], &["lunch"])
    }

    #[test]
    fn output_layout_is_deterministic() {
        let df = frame();
        let mut pre = layout();
        pre.fit(&df).unwrap();

        assert_eq!(
            pre.output_columns(),
            vec![
                "reading score".to_string(),
                "writing score".to_string(),
                "lunch_free/reduced".to_string(),
                "lunch_standard".to_string(),
            ]
        );

        let matrix = pre.transform_matrix(&df).unwrap();
        assert_eq!(matrix.dim(), (4, 4));
    }

    #[test]
    fn learned_state_survives_repeated_transforms() {
        let df = frame();
        let mut pre = layout();
        pre.fit(&df).unwrap();

        let before = serde_json::to_string(&pre).unwrap();
        let first = pre.transform(&df).unwrap();
        let second = pre.transform(&df).unwrap();
        let after = serde_json::to_string(&pre).unwrap();

        assert_eq!(before, after);
        assert!(first.equals(&second));
    }

    #[test]
    fn single_row_matches_training_width() {
        let df = frame();
        let mut pre = layout();
        let train_frame = pre.fit_transform(&df).unwrap();
        let train_width = pre.output_columns().len();
        assert_eq!(train_frame.width(), train_width);

        let row = DataFrame::new(vec![
            Column::new("reading score".into(), &[72i64]),
            Column::new("writing score".into(), &[68i64]),
            Column::new("lunch".into(), &["standard"]),
        ])
        .unwrap();
        let matrix = pre.transform_matrix(&row).unwrap();
        assert_eq!(matrix.dim(), (1, train_width));
    }

    #[test]
    fn transform_before_fit_is_rejected() {
        let pre = layout();
        assert!(matches!(
            pre.transform(&frame()),
            Err(ScorecastError::NotFitted)
        ));
    }

    #[test]
    fn missing_declared_column_is_rejected() {
        let df = frame();
        let mut pre = layout();
        pre.fit(&df).unwrap();

        let partial = df.drop("lunch").unwrap();
        assert!(pre.transform(&partial).is_err());
    }

    #[test]
    fn serde_round_trip_preserves_behavior() {
        let df = frame();
        let mut pre = layout();
        pre.fit(&df).unwrap();

        let json = serde_json::to_string(&pre).unwrap();
        let restored: Preprocessor = serde_json::from_str(&json).unwrap();

        let a = pre.transform_matrix(&df).unwrap();
        let b = restored.transform_matrix(&df).unwrap();
        assert_eq!(a, b);
    }
}

//! Missing value imputation.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// Strategy for filling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Column median (numeric columns).
    Median,
    /// Most frequent value (categorical columns).
    MostFrequent,
}

/// Learned fill value for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Numeric(f64),
    Category(String),
}

/// Per-column imputer. Fill values are learned once at fit time and applied
/// unchanged on every transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Learn a fill value for each of `columns`.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.to_string()))?
                .as_materialized_series()
                .clone();

            let fill_value = match self.strategy {
                ImputeStrategy::Median => Self::compute_median(col_name, &series)?,
                ImputeStrategy::MostFrequent => Self::compute_mode(col_name, &series)?,
            };
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Fill nulls in every fitted column. Numeric columns come out as
    /// `Float64` regardless of their stored integer width.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let series = result
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.clone()))?
                .as_materialized_series()
                .clone();
            let filled = Self::fill_series(&series, fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_median(col_name: &str, series: &Series) -> Result<FillValue> {
        let casted = series.cast(&DataType::Float64)?;
        let median = casted.f64()?.median().ok_or_else(|| {
            ScorecastError::Data(format!(
                "column {col_name:?} has no values to take a median from"
            ))
        })?;
        Ok(FillValue::Numeric(median))
    }

    // Ties go to the lexicographically smallest value so refitting on the
    // same data always learns the same artifact.
    fn compute_mode(col_name: &str, series: &Series) -> Result<FillValue> {
        let ca = series.str()?;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in ca.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut mode: Option<(&str, usize)> = None;
        for (value, count) in counts {
            match mode {
                Some((_, best)) if count <= best => {}
                _ => mode = Some((value, count)),
            }
        }

        let (value, _) = mode.ok_or_else(|| {
            ScorecastError::Data(format!(
                "column {col_name:?} has no values to take a mode from"
            ))
        })?;
        Ok(FillValue::Category(value.to_string()))
    }

    fn fill_series(series: &Series, fill_value: &FillValue) -> Result<Series> {
        match fill_value {
            FillValue::Numeric(val) => {
                let casted = series.cast(&DataType::Float64)?;
                let ca = casted.f64()?;
                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            FillValue::Category(val) => {
                let ca = series.str()?;
                let filled: StringChunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_fill_handles_integer_columns() {
        let df = DataFrame::new(vec![Column::new(
            "score".into(),
            &[Some(10i64), None, Some(20), Some(30)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["score"]).unwrap();

        let col = result.column("score").unwrap().f64().unwrap();
        assert_eq!(col.null_count(), 0);
        assert!((col.get(1).unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn mode_fill_breaks_ties_towards_smallest() {
        let df = DataFrame::new(vec![Column::new(
            "lunch".into(),
            &[Some("standard"), Some("free/reduced"), None, None],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["lunch"]).unwrap();

        let col = result.column("lunch").unwrap().str().unwrap();
        assert_eq!(col.get(2), Some("free/reduced"));
        assert_eq!(col.get(3), Some("free/reduced"));
    }

    #[test]
    fn transform_before_fit_is_rejected() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0, 2.0])]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(
            imputer.transform(&df),
            Err(ScorecastError::NotFitted)
        ));
    }

    #[test]
    fn fit_on_missing_column_errors() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0, 2.0])]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(
            imputer.fit(&df, &["b"]),
            Err(ScorecastError::ColumnNotFound(_))
        ));
    }
}

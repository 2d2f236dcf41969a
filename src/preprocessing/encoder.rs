//! One-hot encoding of categorical columns.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// One-hot encoder with a fixed vocabulary per column.
///
/// Vocabularies are sorted at fit time, so the indicator columns produced by
/// `transform` always appear in the same order. Values outside the fitted
/// vocabulary are rejected rather than silently encoded as all zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// `(source column, sorted categories)` in fit column order.
    vocabularies: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the category vocabulary of each of `columns`.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.vocabularies.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.to_string()))?
                .as_materialized_series()
                .clone();
            let ca = series.str()?;

            let mut categories: Vec<String> =
                ca.into_iter().flatten().map(str::to_string).collect();
            categories.sort_unstable();
            categories.dedup();

            if categories.is_empty() {
                return Err(ScorecastError::Data(format!(
                    "column {col_name:?} has no values to build a vocabulary from"
                )));
            }

            self.vocabularies.push((col_name.to_string(), categories));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Names of the indicator columns `transform` will produce, in order.
    pub fn output_columns(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{col}_{c}")))
            .collect()
    }

    /// Replace each fitted column with its indicator columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let mut result = df.clone();
        for (col_name, categories) in &self.vocabularies {
            let series = result
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.clone()))?
                .as_materialized_series()
                .clone();
            let ca = series.str()?;

            let mut values: Vec<String> = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                let value = opt.ok_or_else(|| ScorecastError::UnknownCategory {
                    column: col_name.clone(),
                    value: "<missing>".to_string(),
                })?;
                if categories.binary_search_by(|c| c.as_str().cmp(value)).is_err() {
                    return Err(ScorecastError::UnknownCategory {
                        column: col_name.clone(),
                        value: value.to_string(),
                    });
                }
                values.push(value.to_string());
            }

            result = result.drop(col_name)?;
            for category in categories {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| if v == category { 1.0 } else { 0.0 })
                    .collect();
                let name = format!("{col_name}_{category}");
                result.with_column(Column::new(name.into(), indicator))?;
            }
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}

//! Feature scaling.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// Learned scaling parameters for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub center: f64,
    pub scale: f64,
}

/// Standardizer over a fixed set of columns.
///
/// With centering disabled (the default here) each value is only divided by
/// the column's standard deviation, which keeps one-hot indicator columns
/// sparse. A column with no spread keeps scale 1.0 and passes through
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    with_mean: bool,
    params: BTreeMap<String, ColumnScale>,
    is_fitted: bool,
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scaler {
    /// Scale-only standardizer (no centering).
    pub fn new() -> Self {
        Self {
            with_mean: false,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Enable or disable mean centering.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Learn center/scale for each of `columns`.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.to_string()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let center = if self.with_mean {
                ca.mean().unwrap_or(0.0)
            } else {
                0.0
            };
            let std = ca.std(1).unwrap_or(0.0);
            let scale = if std.is_finite() && std > 1e-12 {
                std
            } else {
                1.0
            };

            self.params
                .insert(col_name.to_string(), ColumnScale { center, scale });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the learned parameters to every fitted column.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let mut result = df.clone();
        for (col_name, p) in &self.params {
            let series = result
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.clone()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - p.center) / p.scale))
                .collect();
            result.with_column(scaled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned parameters for one column, if fitted.
    pub fn column_scale(&self, column: &str) -> Option<&ColumnScale> {
        self.params.get(column)
    }
}

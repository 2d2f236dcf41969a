//! Model training module
//!
//! Regressors for the training pipeline:
//! - Linear models (OLS, Ridge, Lasso)
//! - Decision tree and Random Forest
//! - Gradient boosting
//! - K-Nearest Neighbors
//!
//! plus the k-fold splitter and regression metrics used to rank them.

pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod linear;
pub mod metrics;
pub mod random_forest;

pub use cross_validation::{CVResults, FoldSplit, KFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use knn::KnnRegressor;
pub use linear::{LassoRegression, LinearRegression, RidgeRegression};
pub use metrics::{r2_score, RegressionMetrics};
pub use random_forest::RandomForest;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Model families the trainer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    DecisionTree,
    GradientBoosting,
    LinearRegression,
    Ridge,
    Lasso,
    Knn,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::Ridge => "ridge",
            ModelKind::Lasso => "lasso",
            ModelKind::Knn => "knn",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grid-search cell: the hyperparameters a candidate overrides.
/// Unset fields fall back to the model family's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    pub alpha: Option<f64>,
    pub max_depth: Option<usize>,
    pub n_estimators: Option<usize>,
    pub learning_rate: Option<f64>,
    pub subsample: Option<f64>,
    pub n_neighbors: Option<usize>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = Some(rate);
        self
    }

    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = Some(subsample);
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = Some(k);
        self
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(v) = self.alpha {
            parts.push(format!("alpha={v}"));
        }
        if let Some(v) = self.max_depth {
            parts.push(format!("max_depth={v}"));
        }
        if let Some(v) = self.n_estimators {
            parts.push(format!("n_estimators={v}"));
        }
        if let Some(v) = self.learning_rate {
            parts.push(format!("learning_rate={v}"));
        }
        if let Some(v) = self.subsample {
            parts.push(format!("subsample={v}"));
        }
        if let Some(v) = self.n_neighbors {
            parts.push(format!("n_neighbors={v}"));
        }
        if parts.is_empty() {
            f.write_str("defaults")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A fitted regressor of any supported family, ready to persist or query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedRegressor {
    Linear(LinearRegression),
    Ridge(RidgeRegression),
    Lasso(LassoRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingRegressor),
    Knn(KnnRegressor),
}

impl TrainedRegressor {
    /// Build and fit a regressor of the given family, filling unset
    /// hyperparameters with that family's defaults.
    pub fn fit(
        kind: ModelKind,
        params: &ParamSet,
        x: &Array2<f64>,
        y: &Array1<f64>,
        seed: u64,
    ) -> Result<Self> {
        match kind {
            ModelKind::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y)?;
                Ok(TrainedRegressor::Linear(model))
            }
            ModelKind::Ridge => {
                let mut model = RidgeRegression::new(params.alpha.unwrap_or(1.0));
                model.fit(x, y)?;
                Ok(TrainedRegressor::Ridge(model))
            }
            ModelKind::Lasso => {
                let mut model = LassoRegression::new(params.alpha.unwrap_or(1.0));
                model.fit(x, y)?;
                Ok(TrainedRegressor::Lasso(model))
            }
            ModelKind::DecisionTree => {
                let mut model =
                    DecisionTree::new().with_max_depth(params.max_depth.unwrap_or(16));
                model.fit(x, y)?;
                Ok(TrainedRegressor::DecisionTree(model))
            }
            ModelKind::RandomForest => {
                let mut model = RandomForest::new(params.n_estimators.unwrap_or(64))
                    .with_max_depth(params.max_depth.unwrap_or(16))
                    .with_seed(seed);
                model.fit(x, y)?;
                Ok(TrainedRegressor::RandomForest(model))
            }
            ModelKind::GradientBoosting => {
                let config = GradientBoostingConfig {
                    n_estimators: params.n_estimators.unwrap_or(100),
                    learning_rate: params.learning_rate.unwrap_or(0.1),
                    max_depth: params.max_depth.unwrap_or(3),
                    subsample: params.subsample.unwrap_or(1.0),
                    seed,
                    ..Default::default()
                };
                let mut model = GradientBoostingRegressor::new(config);
                model.fit(x, y)?;
                Ok(TrainedRegressor::GradientBoosting(model))
            }
            ModelKind::Knn => {
                let mut model = KnnRegressor::new(params.n_neighbors.unwrap_or(5));
                model.fit(x, y)?;
                Ok(TrainedRegressor::Knn(model))
            }
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedRegressor::Linear(m) => m.predict(x),
            TrainedRegressor::Ridge(m) => m.predict(x),
            TrainedRegressor::Lasso(m) => m.predict(x),
            TrainedRegressor::DecisionTree(m) => m.predict(x),
            TrainedRegressor::RandomForest(m) => m.predict(x),
            TrainedRegressor::GradientBoosting(m) => m.predict(x),
            TrainedRegressor::Knn(m) => m.predict(x),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedRegressor::Linear(_) => ModelKind::LinearRegression,
            TrainedRegressor::Ridge(_) => ModelKind::Ridge,
            TrainedRegressor::Lasso(_) => ModelKind::Lasso,
            TrainedRegressor::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedRegressor::RandomForest(_) => ModelKind::RandomForest,
            TrainedRegressor::GradientBoosting(_) => ModelKind::GradientBoosting,
            TrainedRegressor::Knn(_) => ModelKind::Knn,
        }
    }
}

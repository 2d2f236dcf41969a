//! Model training stage: candidate catalog, grid search, selection.

use std::path::{Path, PathBuf};

use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::save_artifact;
use crate::error::{Result, ScorecastError};
use crate::models::{
    r2_score, CVResults, KFold, ModelKind, ParamSet, RegressionMetrics, TrainedRegressor,
};

/// One catalog entry: a model family and the hyperparameter grid searched
/// for it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub kind: ModelKind,
    pub grid: Vec<ParamSet>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, kind: ModelKind, grid: Vec<ParamSet>) -> Self {
        Self {
            name: name.into(),
            kind,
            grid,
        }
    }
}

/// The fixed candidate catalog. Order matters: score ties go to the
/// earlier entry.
pub fn default_catalog() -> Vec<Candidate> {
    vec![
        Candidate::new(
            "random_forest",
            ModelKind::RandomForest,
            [8, 16, 32, 64]
                .iter()
                .map(|&n| ParamSet::new().with_n_estimators(n))
                .collect(),
        ),
        Candidate::new(
            "decision_tree",
            ModelKind::DecisionTree,
            [4, 6, 8, 16]
                .iter()
                .map(|&d| ParamSet::new().with_max_depth(d))
                .collect(),
        ),
        Candidate::new("gradient_boosting", ModelKind::GradientBoosting, {
            let mut grid = Vec::new();
            for &learning_rate in &[0.1, 0.05] {
                for &n_estimators in &[50, 100] {
                    for &subsample in &[0.8, 1.0] {
                        grid.push(
                            ParamSet::new()
                                .with_learning_rate(learning_rate)
                                .with_n_estimators(n_estimators)
                                .with_subsample(subsample),
                        );
                    }
                }
            }
            grid
        }),
        Candidate::new(
            "linear_regression",
            ModelKind::LinearRegression,
            vec![ParamSet::new()],
        ),
        Candidate::new(
            "ridge",
            ModelKind::Ridge,
            [0.1, 1.0, 10.0]
                .iter()
                .map(|&a| ParamSet::new().with_alpha(a))
                .collect(),
        ),
        Candidate::new(
            "lasso",
            ModelKind::Lasso,
            [0.01, 0.1, 1.0]
                .iter()
                .map(|&a| ParamSet::new().with_alpha(a))
                .collect(),
        ),
        Candidate::new(
            "knn",
            ModelKind::Knn,
            [3, 5, 7]
                .iter()
                .map(|&k| ParamSet::new().with_n_neighbors(k))
                .collect(),
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub model_path: PathBuf,
    pub cv_folds: usize,
    pub seed: u64,
    /// Minimum held-out R² the winner must reach before it is persisted.
    pub min_score: f64,
    pub catalog: Vec<Candidate>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::in_dir("artifacts")
    }
}

impl TrainerConfig {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            model_path: dir.as_ref().join("model.json"),
            cv_folds: 3,
            seed: 42,
            min_score: 0.6,
            catalog: default_catalog(),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<Candidate>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Per-candidate outcome: the grid winner and its scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub name: String,
    pub kind: ModelKind,
    pub best_params: ParamSet,
    pub cv_score: f64,
    pub test_r2: f64,
}

/// Outcome of the full training stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub best_model: String,
    pub best_score: f64,
    pub model_path: PathBuf,
    pub metrics: RegressionMetrics,
    pub candidates: Vec<CandidateReport>,
}

/// Third pipeline stage. Grid-searches every catalog entry with k-fold
/// cross-validation on the training matrix, refits each family's best
/// parameters on the full training matrix, ranks families by held-out R²,
/// and persists the winner only after the whole catalog evaluated and the
/// score gate passed.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Both matrices carry the target as their last column.
    pub fn run(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingReport> {
        match self.evaluate(train, test) {
            Err(e @ ScorecastError::Training { .. }) => Err(e),
            Err(e) => Err(ScorecastError::training(e.to_string())),
            ok => ok,
        }
    }

    fn evaluate(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingReport> {
        if self.config.catalog.is_empty() {
            return Err(ScorecastError::InvalidParameter {
                name: "catalog".to_string(),
                value: "[]".to_string(),
                reason: "needs at least one candidate".to_string(),
            });
        }

        let (x_train, y_train) = split_target(train)?;
        let (x_test, y_test) = split_target(test)?;

        let mut reports = Vec::with_capacity(self.config.catalog.len());
        let mut fitted = Vec::with_capacity(self.config.catalog.len());

        for candidate in &self.config.catalog {
            let (best_params, cv_score) = self.grid_search(candidate, &x_train, &y_train)?;

            let model = TrainedRegressor::fit(
                candidate.kind,
                &best_params,
                &x_train,
                &y_train,
                self.config.seed,
            )?;
            let y_pred = model.predict(&x_test)?;
            let test_r2 = r2_score(&y_test, &y_pred)?;

            info!(
                model = %candidate.name,
                params = %best_params,
                cv_r2 = cv_score,
                test_r2,
                "evaluated candidate"
            );

            reports.push(CandidateReport {
                name: candidate.name.clone(),
                kind: candidate.kind,
                best_params,
                cv_score,
                test_r2,
            });
            fitted.push(model);
        }

        let best_idx = select_best(&reports);
        let best = &reports[best_idx];

        // NaN must not slip past the gate.
        if !(best.test_r2 >= self.config.min_score) {
            return Err(ScorecastError::training(format!(
                "no model reached the minimum r2 of {}: best was {} at {:.4}",
                self.config.min_score, best.name, best.test_r2
            )));
        }

        save_artifact(&self.config.model_path, &fitted[best_idx])?;
        info!(
            model = %best.name,
            r2 = best.test_r2,
            path = %self.config.model_path.display(),
            "selected and saved best model"
        );

        let y_pred = fitted[best_idx].predict(&x_test)?;
        let metrics = RegressionMetrics::compute(&y_test, &y_pred)?;

        Ok(TrainingReport {
            best_model: best.name.clone(),
            best_score: best.test_r2,
            model_path: self.config.model_path.clone(),
            metrics,
            candidates: reports,
        })
    }

    /// Mean CV R² per grid cell; the first strictly-best cell wins.
    fn grid_search(
        &self,
        candidate: &Candidate,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(ParamSet, f64)> {
        if candidate.grid.is_empty() {
            return Err(ScorecastError::InvalidParameter {
                name: "grid".to_string(),
                value: candidate.name.clone(),
                reason: "candidate has no parameter sets".to_string(),
            });
        }

        let folds = KFold::new(self.config.cv_folds)
            .with_seed(self.config.seed)
            .split(x.nrows())?;

        let mut best_params = candidate.grid[0].clone();
        let mut best_score = f64::NEG_INFINITY;
        for params in &candidate.grid {
            let mut scores = Vec::with_capacity(folds.len());
            for fold in &folds {
                let x_tr = x.select(Axis(0), &fold.train_indices);
                let y_tr = Array1::from_vec(
                    fold.train_indices.iter().map(|&i| y[i]).collect(),
                );
                let x_va = x.select(Axis(0), &fold.test_indices);
                let y_va = Array1::from_vec(
                    fold.test_indices.iter().map(|&i| y[i]).collect(),
                );

                let model =
                    TrainedRegressor::fit(candidate.kind, params, &x_tr, &y_tr, self.config.seed)?;
                let pred = model.predict(&x_va)?;
                scores.push(r2_score(&y_va, &pred)?);
            }

            let results = CVResults::from_scores(scores);
            if results.mean_score > best_score {
                best_score = results.mean_score;
                best_params = params.clone();
            }
        }

        Ok((best_params, best_score))
    }
}

/// Split the target off the last column.
fn split_target(data: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let n_cols = data.ncols();
    if n_cols < 2 {
        return Err(ScorecastError::Data(format!(
            "training matrix needs features plus a target column, got {n_cols} column(s)"
        )));
    }
    let x = data.slice(s![.., ..n_cols - 1]).to_owned();
    let y = data.column(n_cols - 1).to_owned();
    Ok((x, y))
}

/// Index of the highest held-out R²; earlier entries win ties.
fn select_best(reports: &[CandidateReport]) -> usize {
    let mut best_idx = 0;
    for (idx, report) in reports.iter().enumerate().skip(1) {
        if report.test_r2 > reports[best_idx].test_r2 {
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn line_matrices() -> (Array2<f64>, Array2<f64>) {
        // y = 3x + 2 with the target appended as the last column.
        let train = Array2::from_shape_fn((12, 2), |(r, c)| {
            let x = r as f64;
            if c == 0 {
                x
            } else {
                3.0 * x + 2.0
            }
        });
        let test = Array2::from_shape_fn((4, 2), |(r, c)| {
            let x = 20.0 + r as f64;
            if c == 0 {
                x
            } else {
                3.0 * x + 2.0
            }
        });
        (train, test)
    }

    fn report(name: &str, test_r2: f64) -> CandidateReport {
        CandidateReport {
            name: name.to_string(),
            kind: ModelKind::Ridge,
            best_params: ParamSet::new(),
            cv_score: test_r2,
            test_r2,
        }
    }

    #[test]
    fn test_default_catalog_order_is_fixed() {
        let catalog = default_catalog();
        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "random_forest",
                "decision_tree",
                "gradient_boosting",
                "linear_regression",
                "ridge",
                "lasso",
                "knn",
            ]
        );
    }

    #[test]
    fn test_ties_go_to_the_earlier_candidate() {
        let reports = vec![report("first", 0.9), report("second", 0.9)];
        assert_eq!(select_best(&reports), 0);

        let reports = vec![report("first", 0.7), report("second", 0.9)];
        assert_eq!(select_best(&reports), 1);
    }

    #[test]
    fn test_trains_and_persists_winner() {
        let dir = tempfile::tempdir().unwrap();
        let (train, test) = line_matrices();

        let config = TrainerConfig::in_dir(dir.path()).with_catalog(vec![Candidate::new(
            "ridge",
            ModelKind::Ridge,
            vec![
                ParamSet::new().with_alpha(0.1),
                ParamSet::new().with_alpha(1.0),
            ],
        )]);
        let trainer = ModelTrainer::new(config);
        let report = trainer.run(&train, &test).unwrap();

        assert_eq!(report.best_model, "ridge");
        assert!(report.best_score > 0.9);
        assert!(report.model_path.exists());
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.metrics.n_samples, 4);
    }

    #[test]
    fn test_low_scores_block_persistence() {
        let dir = tempfile::tempdir().unwrap();
        // Constant target: r2 is 0.0 for every model, below the 0.6 gate.
        let train = Array2::from_shape_fn((12, 2), |(r, c)| if c == 0 { r as f64 } else { 5.0 });
        let test = Array2::from_shape_fn((4, 2), |(r, c)| if c == 0 { r as f64 } else { 5.0 });

        let config = TrainerConfig::in_dir(dir.path()).with_catalog(vec![Candidate::new(
            "ridge",
            ModelKind::Ridge,
            vec![ParamSet::new().with_alpha(1.0)],
        )]);
        let trainer = ModelTrainer::new(config);

        let err = trainer.run(&train, &test).unwrap_err();
        assert!(err.to_string().contains("minimum r2"));
        assert!(!trainer.config().model_path.exists());
    }

    #[test]
    fn test_single_column_matrix_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(TrainerConfig::in_dir(dir.path()));
        let degenerate = Array2::from_shape_fn((6, 1), |(r, _)| r as f64);

        let err = trainer.run(&degenerate, &degenerate).unwrap_err();
        assert!(err.to_string().contains("model training failed"));
    }
}

//! Gradient boosted regression trees

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use crate::error::{Result, ScorecastError};

/// Boosting hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) per round.
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

/// Squared-loss gradient boosting. Each round fits a shallow tree to the
/// residuals of the running ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    n_features: usize,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.validate_config()?;

        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ScorecastError::ShapeMismatch {
                expected: n_samples,
                actual: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(ScorecastError::Data(
                "cannot fit on an empty feature matrix".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.trees = Vec::with_capacity(self.config.n_estimators);
        self.initial_prediction = y.mean().unwrap_or(0.0);

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        for _ in 0..self.config.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(yi, pi)| yi - pi)
                .collect();

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);

            if self.config.subsample < 1.0 {
                let sample_indices = subsample_indices(n_samples, self.config.subsample, &mut rng);
                let x_sub = x.select(Axis(0), &sample_indices);
                let residuals_sub: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| residuals[i]).collect());
                tree.fit(&x_sub, &residuals_sub)?;
            } else {
                tree.fit(x, &residuals)?;
            }

            // The running predictions advance over every row, including
            // rows the tree never saw this round.
            let tree_pred = tree.predict(x)?;
            for i in 0..n_samples {
                predictions[i] += self.config.learning_rate * tree_pred[i];
            }

            self.trees.push(tree);
        }

        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ScorecastError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ScorecastError::ShapeMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }

        let n = x.nrows();
        let mut predictions = Array1::from_elem(n, self.initial_prediction);
        for tree in &self.trees {
            let tree_pred = tree.predict(x)?;
            for i in 0..n {
                predictions[i] += self.config.learning_rate * tree_pred[i];
            }
        }
        Ok(predictions)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.n_estimators == 0 {
            return Err(ScorecastError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "boosting needs at least one round".to_string(),
            });
        }
        if self.config.learning_rate <= 0.0 {
            return Err(ScorecastError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.config.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.config.subsample <= 0.0 || self.config.subsample > 1.0 {
            return Err(ScorecastError::InvalidParameter {
                name: "subsample".to_string(),
                value: self.config.subsample.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

fn subsample_indices(n: usize, subsample: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let sample_size = (((n as f64) * subsample).ceil() as usize).max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(sample_size);
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| i as f64 * 0.1).collect())
            .unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| row[0] * 2.0 + row[1] * 0.5 + 1.0)
            .collect();
        (x, y)
    }

    #[test]
    fn test_boosting_beats_mean_baseline() {
        let (x, y) = plane_data();
        let config = GradientBoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            ..Default::default()
        };

        let mut model = GradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 20);

        let predictions = model.predict(&x).unwrap();
        let mse: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(yi, pi)| (yi - pi).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        let y_var = y.var(0.0);
        assert!(mse < y_var, "MSE ({}) not below variance ({})", mse, y_var);
    }

    #[test]
    fn test_subsampled_rounds_still_learn() {
        let (x, y) = plane_data();
        let config = GradientBoostingConfig {
            n_estimators: 20,
            subsample: 0.8,
            ..Default::default()
        };

        let mut model = GradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let mse: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(yi, pi)| (yi - pi).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < y.var(0.0));
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = plane_data();
        let config = GradientBoostingConfig {
            n_estimators: 5,
            subsample: 0.7,
            ..Default::default()
        };

        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (x, y) = plane_data();

        let zero_rounds = GradientBoostingConfig {
            n_estimators: 0,
            ..Default::default()
        };
        assert!(GradientBoostingRegressor::new(zero_rounds).fit(&x, &y).is_err());

        let bad_rate = GradientBoostingConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(GradientBoostingRegressor::new(bad_rate).fit(&x, &y).is_err());

        let bad_subsample = GradientBoostingConfig {
            subsample: 1.5,
            ..Default::default()
        };
        assert!(GradientBoostingRegressor::new(bad_subsample)
            .fit(&x, &y)
            .is_err());
    }

    #[test]
    fn test_predict_before_fit_rejected() {
        let model = GradientBoostingRegressor::new(GradientBoostingConfig::default());
        let x = Array2::<f64>::zeros((1, 2));
        assert!(matches!(
            model.predict(&x),
            Err(ScorecastError::NotFitted)
        ));
    }
}

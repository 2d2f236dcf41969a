//! K-fold cross-validation splitter

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// A single train/validation split.
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold: usize,
}

/// Seeded k-fold splitter. The same `(n_splits, seed)` pair always yields the
/// same folds for a given sample count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: 3,
            shuffle: true,
            seed: 42,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the fold assignments for `n_samples` rows.
    pub fn split(&self, n_samples: usize) -> Result<Vec<FoldSplit>> {
        if self.n_splits < 2 {
            return Err(ScorecastError::InvalidParameter {
                name: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if n_samples < self.n_splits {
            return Err(ScorecastError::InvalidParameter {
                name: "n_samples".to_string(),
                value: n_samples.to_string(),
                reason: format!("must be >= n_splits ({})", self.n_splits),
            });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        // Spread the remainder over the leading folds so sizes differ by at
        // most one.
        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut splits = Vec::with_capacity(self.n_splits);
        let mut current = 0;

        for fold in 0..self.n_splits {
            let fold_size = if fold < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(FoldSplit {
                train_indices,
                test_indices,
                fold,
            });

            current += fold_size;
        }

        Ok(splits)
    }
}

/// Aggregated fold scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    pub scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    pub n_folds: usize,
}

impl CVResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_all_rows() {
        let splits = KFold::new(3).split(10).unwrap();
        assert_eq!(splits.len(), 3);

        let mut all_test: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.test_indices.clone())
            .collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        // 10 rows over 3 folds: sizes 4, 3, 3.
        assert_eq!(splits[0].test_indices.len(), 4);
        assert_eq!(splits[1].test_indices.len(), 3);
        assert_eq!(splits[2].test_indices.len(), 3);
    }

    #[test]
    fn test_train_and_test_are_disjoint() {
        for split in KFold::new(3).split(12).unwrap() {
            for idx in &split.test_indices {
                assert!(!split.train_indices.contains(idx));
            }
            assert_eq!(
                split.train_indices.len() + split.test_indices.len(),
                12
            );
        }
    }

    #[test]
    fn test_same_seed_same_folds() {
        let a = KFold::new(3).with_seed(7).split(20).unwrap();
        let b = KFold::new(3).with_seed(7).split(20).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.test_indices, y.test_indices);
            assert_eq!(x.train_indices, y.train_indices);
        }
    }

    #[test]
    fn test_degenerate_configs_rejected() {
        assert!(KFold::new(1).split(10).is_err());
        assert!(KFold::new(5).split(3).is_err());
    }

    #[test]
    fn test_cv_results_from_scores() {
        let results = CVResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert_eq!(results.n_folds, 3);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert!(results.std_score > 0.0);
    }
}

//! Regression decision tree

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecastError};

/// Tree node, either a prediction leaf or an axis-aligned split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// CART-style regression tree minimizing within-node variance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
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
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0));
        Ok(self)
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
    ) -> TreeNode {
        let n_samples = indices.len();
        let leaf = |indices: &[usize]| TreeNode::Leaf {
            value: mean_of(y, indices),
            n_samples: indices.len(),
        };

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);
        if should_stop {
            return leaf(indices);
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices) else {
            return leaf(indices);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf
            || right_indices.len() < self.min_samples_leaf
        {
            return leaf(indices);
        }

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build_node(x, y, &left_indices, depth + 1)),
            right: Box::new(self.build_node(x, y, &right_indices, depth + 1)),
        }
    }

    /// Best (feature, threshold) by variance reduction, or `None` when no
    /// split improves on the parent.
    ///
    /// Each feature is scanned once over its sorted values with running
    /// sums, so a node costs O(n log n) per feature instead of a full
    /// rescan per candidate threshold.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let n_f = n as f64;

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq_sum: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = variance_from_sums(n, total_sum, total_sq_sum);

        let per_feature: Vec<Option<(usize, f64, f64)>> = (0..self.n_features)
            .into_par_iter()
            .map(|feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                pairs.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
                });

                let mut best: Option<(f64, f64)> = None;
                let mut left_sum = 0.0;
                let mut left_sq_sum = 0.0;

                for i in 1..n {
                    let (prev_value, prev_y) = pairs[i - 1];
                    left_sum += prev_y;
                    left_sq_sum += prev_y * prev_y;

                    // Only boundaries between distinct values are real splits.
                    if pairs[i].0 <= prev_value {
                        continue;
                    }
                    if i < self.min_samples_leaf || n - i < self.min_samples_leaf {
                        continue;
                    }

                    let left_impurity = variance_from_sums(i, left_sum, left_sq_sum);
                    let right_impurity = variance_from_sums(
                        n - i,
                        total_sum - left_sum,
                        total_sq_sum - left_sq_sum,
                    );
                    let weighted = (i as f64 * left_impurity
                        + (n - i) as f64 * right_impurity)
                        / n_f;
                    let gain = parent_impurity - weighted;

                    if gain > 0.0 && best.map_or(true, |(g, _)| gain > g) {
                        best = Some((gain, (prev_value + pairs[i].0) / 2.0));
                    }
                }

                best.map(|(gain, threshold)| (feature_idx, threshold, gain))
            })
            .collect();

        // First feature wins ties so refits are reproducible.
        let mut winner: Option<(usize, f64, f64)> = None;
        for candidate in per_feature.into_iter().flatten() {
            if winner.map_or(true, |(_, _, g)| candidate.2 > g) {
                winner = Some(candidate);
            }
        }
        winner.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ScorecastError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ScorecastError::ShapeMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => return *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature_idx] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => {
                    1 + node_depth(left).max(node_depth(right))
                }
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn variance_from_sums(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    // Var = E[y^2] - E[y]^2, clamped against rounding below zero.
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first) => indices.iter().all(|&i| (y[i] - y[first]).abs() < 1e-10),
    }
}

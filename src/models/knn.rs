//! K-nearest-neighbors regressor

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, ScorecastError};

/// Uniform-weight Euclidean KNN. Fitting just memorizes the training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnRegressor {
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KnnRegressor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl KnnRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(ScorecastError::ShapeMismatch {
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if self.n_neighbors == 0 {
            return Err(ScorecastError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if x.nrows() < self.n_neighbors {
            return Err(ScorecastError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: self.n_neighbors.to_string(),
                reason: format!("training set has only {} rows", x.nrows()),
            });
        }

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(ScorecastError::NotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(ScorecastError::NotFitted)?;
        if x.ncols() != x_train.ncols() {
            return Err(ScorecastError::ShapeMismatch {
                expected: x_train.ncols(),
                actual: x.ncols(),
            });
        }

        let k = self.n_neighbors;
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k);
                neighbors.iter().map(|(_, y)| y).sum::<f64>() / neighbors.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

/// Max-heap entry so the heap top is the worst of the kept neighbors.
#[derive(PartialEq)]
struct Neighbor(f64, f64);

impl Eq for Neighbor {}
impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Partial sort over a bounded heap, O(n log k) per query point.
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<(f64, f64)> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (i, row) in x_train.rows().into_iter().enumerate() {
        let dist = euclidean(point, row);
        if heap.len() < k {
            heap.push(Neighbor(dist, y_train[i]));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(Neighbor(dist, y_train[i]));
            }
        }
    }

    heap.into_iter().map(|n| (n.0, n.1)).collect()
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

//! Seeded train/test splitting.

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, ScorecastError};

/// Partition `df` into train and test frames.
///
/// Row indices are shuffled with a ChaCha8 generator seeded from `seed`, so
/// the same input and seed always produce the same partition. The test side
/// gets `round(n * test_size)` rows, clamped so neither side ends up empty.
pub fn train_test_split(
    df: &DataFrame,
    test_size: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ScorecastError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let n = df.height();
    if n < 2 {
        return Err(ScorecastError::Data(format!(
            "cannot split {n} row(s) into train and test partitions"
        )));
    }

    let mut indices: Vec<u32> = (0..n as u32).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_size).round() as usize;
    let n_test = n_test.clamp(1, n - 1);

    let test_idx = UInt32Chunked::from_vec("idx".into(), indices[..n_test].to_vec());
    let train_idx = UInt32Chunked::from_vec("idx".into(), indices[n_test..].to_vec());

    let test = df.take(&test_idx)?;
    let train = df.take(&train_idx)?;
    Ok((train, test))
}

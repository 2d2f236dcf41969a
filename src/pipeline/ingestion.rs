//! Data ingestion stage: raw CSV in, train/test CSVs out.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{read_csv, train_test_split, write_csv};
use crate::error::{Result, ScorecastError};

/// Where the ingestion stage reads from and writes to, plus the split
/// parameters. The raw source path arrives per run; only the artifact
/// layout lives here.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub raw_data_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    pub test_size: f64,
    pub seed: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self::in_dir("artifacts")
    }
}

impl IngestionConfig {
    /// Standard artifact layout rooted at `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            raw_data_path: dir.join("data.csv"),
            train_data_path: dir.join("train.csv"),
            test_data_path: dir.join("test.csv"),
            test_size: 0.2,
            seed: 42,
        }
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// First pipeline stage. Copies the source dataset into the artifact
/// directory and splits it into reproducible train and test partitions.
#[derive(Debug, Clone, Default)]
pub struct DataIngestion {
    config: IngestionConfig,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Run the stage against `source`. Returns the train and test CSV paths.
    pub fn run(&self, source: &Path) -> Result<(PathBuf, PathBuf)> {
        self.ingest(source)
            .map_err(|e| ScorecastError::ingestion(e.to_string()))
    }

    fn ingest(&self, source: &Path) -> Result<(PathBuf, PathBuf)> {
        let df = read_csv(source)?;
        info!(rows = df.height(), columns = df.width(), source = %source.display(), "loaded raw dataset");

        let mut raw = df.clone();
        write_csv(&mut raw, &self.config.raw_data_path)?;

        let (mut train, mut test) =
            train_test_split(&df, self.config.test_size, self.config.seed)?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "split dataset"
        );

        write_csv(&mut train, &self.config.train_data_path)?;
        write_csv(&mut test, &self.config.test_data_path)?;

        Ok((
            self.config.train_data_path.clone(),
            self.config.test_data_path.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_csv(dir: &Path) -> PathBuf {
        let path = dir.join("students.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "gender,reading score,writing score,math score").unwrap();
        for i in 0..10 {
            let gender = if i % 2 == 0 { "female" } else { "male" };
            writeln!(file, "{},{},{},{}", gender, 60 + i, 55 + i, 58 + i).unwrap();
        }
        path
    }

    #[test]
    fn test_run_writes_all_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_csv(dir.path());

        let stage = DataIngestion::new(IngestionConfig::in_dir(dir.path().join("artifacts")));
        let (train_path, test_path) = stage.run(&source).unwrap();

        assert!(stage.config().raw_data_path.exists());
        let train = read_csv(&train_path).unwrap();
        let test = read_csv(&test_path).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);
        assert_eq!(train.width(), 4);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_csv(dir.path());
        let stage = DataIngestion::new(IngestionConfig::in_dir(dir.path().join("artifacts")));

        stage.run(&source).unwrap();
        let first_train = read_csv(&stage.config().train_data_path).unwrap();
        stage.run(&source).unwrap();
        let second_train = read_csv(&stage.config().train_data_path).unwrap();

        assert!(first_train.equals(&second_train));
    }

    #[test]
    fn test_missing_source_is_stage_error() {
        let dir = tempfile::tempdir().unwrap();
        let stage = DataIngestion::new(IngestionConfig::in_dir(dir.path()));

        let err = stage.run(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("data ingestion failed"));
    }
}

//! Persistence helpers for fitted pipeline objects.
//!
//! Artifacts are stored as pretty-printed JSON so they stay inspectable and
//! diffable. Both the preprocessor and the trained model go through this
//! pair, keeping serialization conventions in one place.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ScorecastError};

/// Serialize `artifact` to `path`, creating parent directories as needed.
pub fn save_artifact<T: Serialize>(path: impl AsRef<Path>, artifact: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json)?;
    Ok(())
}

/// Deserialize an artifact of type `T` from `path`.
pub fn load_artifact<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScorecastError::ArtifactMissing(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Fitted {
        scale: f64,
        columns: Vec<String>,
    }

    #[test]
    fn round_trip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/fitted.json");

        let original = Fitted {
            scale: 2.5,
            columns: vec!["reading score".to_string(), "writing score".to_string()],
        };
        save_artifact(&path, &original).unwrap();

        let loaded: Fitted = load_artifact(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_missing_artifact_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_artifact::<Fitted>(&path).unwrap_err();
        assert!(matches!(err, ScorecastError::ArtifactMissing(_)));
    }
}

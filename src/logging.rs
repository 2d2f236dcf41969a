//! Run-scoped file logging.
//!
//! Every process start gets its own timestamped log file under the given
//! directory. Library code only emits `tracing` events; installing the
//! subscriber is the binary's job, once, through [`init`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Install the global subscriber, writing to `logs/<MM_DD_YYYY_HH_MM_SS>.log`
/// under `log_dir`. Returns the path of the created log file.
///
/// Level filtering follows `RUST_LOG` when set, defaulting to
/// `scorecast=info`. Must be called at most once per process.
pub fn init(log_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = log_dir.as_ref();
    fs::create_dir_all(dir)?;

    let file_name = format!("{}.log", Local::now().format("%m_%d_%Y_%H_%M_%S"));
    let path = dir.join(file_name);
    let file = File::create(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "scorecast=info".into()),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process, so this
    // only exercises the file naming side of init indirectly.
    #[test]
    fn log_file_name_uses_run_timestamp() {
        let name = format!("{}.log", Local::now().format("%m_%d_%Y_%H_%M_%S"));
        let parts: Vec<&str> = name.trim_end_matches(".log").split('_').collect();
        assert_eq!(parts.len(), 6);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }
}

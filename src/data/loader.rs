//! CSV plumbing shared by the pipeline stages.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;

use crate::error::Result;

/// Read a headered CSV into a DataFrame, inferring dtypes from the leading
/// rows.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let file = File::open(path.as_ref())?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Write a DataFrame as CSV, creating parent directories as needed.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

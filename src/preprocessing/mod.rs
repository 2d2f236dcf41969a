//! Data preprocessing module
//!
//! Feature preparation for the training and prediction pipelines:
//! - Missing value imputation (median for numeric, mode for categorical)
//! - One-hot encoding with a deterministic, sorted vocabulary
//! - Scale-only standardization shared by numeric and indicator columns

mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use imputer::{FillValue, ImputeStrategy, Imputer};
pub use pipeline::Preprocessor;
pub use scaler::{ColumnScale, Scaler};

pub(crate) use pipeline::columns_to_array2;

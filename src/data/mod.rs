//! Dataset schema and CSV plumbing.

pub mod loader;
pub mod schema;
pub mod split;

pub use loader::{read_csv, write_csv};
pub use split::train_test_split;

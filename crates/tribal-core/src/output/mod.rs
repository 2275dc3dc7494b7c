//! Season output: the end-of-run summary.

pub mod summary;

pub use summary::{build_summary, write_summary, DEFAULT_SUMMARY_PATH};

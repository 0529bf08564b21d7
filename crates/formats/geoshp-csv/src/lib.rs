//! CSV reader for `geoshp`.
//!
//! Delimited text with latitude/longitude columns is exposed as a
//! [`geoshp_core_common::Dataset`] whose first field is a point geometry.
//! Column types are inferred from a sample of rows.

mod infer;
pub mod reader;

pub use reader::{CsvReader, CsvReaderOptions};

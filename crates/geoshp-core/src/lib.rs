//! `geoshp-core` is the core library of `geoshp`, which exports vector
//! datasets as ESRI Shapefiles.
//!
//! This crate includes:
//! - **Schema Normalization**: [`normalize::SchemaNormalizer`] reshapes an input
//!   schema into the single-geometry shapefile layout and re-expresses each
//!   record under it, lazily and in order.
//! - **Driver Registry**: A static registry of formats and their capabilities,
//!   plus factories for the matching readers and writers.
//! - **Operations**: [`operations::convert`] and [`operations::inspect`].
//! - **Errors**: [`error::GeoShpError`] with user-facing messages and recovery
//!   suggestions.

pub mod drivers;
pub mod error;
pub mod normalize;
pub mod operations;
pub mod options;
pub mod types;

pub use error::{GeoShpError, Result};
pub use geoshp_core_common::{Field, Record, Schema, SchemaError};
pub use normalize::{
    GeometryRename, NormalizedRecords, SchemaNormalizer, TargetFormat, normalize_record,
};
pub use options::ConvertOptions;

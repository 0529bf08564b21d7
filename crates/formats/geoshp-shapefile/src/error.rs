//! Errors raised while encoding a shapefile.

use std::path::PathBuf;

use geoshp_core_common::{GeometryType, RecordRef};
use thiserror::Error;

/// Result type for shapefile writing
pub type ShapefileResult<T> = Result<T, ShapefileWriteError>;

#[derive(Debug, Error)]
pub enum ShapefileWriteError {
    /// The schema does not have the layout a shapefile requires.
    #[error("Schema cannot be written as a shapefile: {message}")]
    UnsupportedLayout { message: String },

    /// Two attribute names map to the same dBase column name.
    #[error("Fields '{first}' and '{second}' both map to dBase column '{column}'")]
    FieldNameCollision {
        first: String,
        second: String,
        column: String,
    },

    /// A geometry does not match the schema's geometry subtype.
    #[error("{record} has a {found} geometry but the layer stores {expected}")]
    GeometryMismatch {
        record: RecordRef,
        expected: GeometryType,
        found: GeometryType,
    },

    /// A record has no geometry.
    #[error("{record} has no geometry")]
    NullGeometry { record: RecordRef },

    /// A geometry that the shapefile encoding cannot represent.
    #[error("{record} has an invalid geometry: {message}")]
    InvalidGeometry { record: RecordRef, message: String },

    /// An attribute value does not fit its column type.
    #[error("{record} has a {found} value in {expected} field '{field}'")]
    ValueType {
        record: RecordRef,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A component file already exists and overwriting is disabled.
    #[error("Output '{}' already exists", path.display())]
    OutputExists { path: PathBuf },
}

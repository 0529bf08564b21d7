//! Structural schema errors.
//!
//! These describe input whose shape is incompatible with the target format.
//! None of them are transient, so callers abort the job instead of retrying.

use thiserror::Error;

use crate::record::RecordRef;
use crate::schema::GeometryType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema has no geometry-typed field.
    #[error("Schema has no geometry field")]
    NoGeometryField,

    /// The schema has more than one geometry-typed field.
    #[error("Schema has more than one geometry field: {}", fields.join(", "))]
    MultipleGeometryFields {
        /// Names of every geometry field, in schema order
        fields: Vec<String>,
    },

    /// The geometry subtype cannot be stored by the target format.
    #[error("Geometry field '{field}' has unsupported subtype {geometry_type}")]
    UnsupportedGeometrySubtype {
        /// The geometry field name
        field: String,
        /// The offending subtype
        geometry_type: GeometryType,
    },

    /// Two fields would share a name.
    #[error("Field name '{name}' is used more than once")]
    DuplicateField {
        /// The repeated name
        name: String,
    },

    /// A required value is absent from a record.
    #[error("{record} has no value for required field '{field}'")]
    MissingValue {
        /// The field looked up in the source record
        field: String,
        /// The record that failed
        record: RecordRef,
    },
}

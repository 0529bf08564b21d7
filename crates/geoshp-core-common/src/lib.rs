//! Common types and traits shared across `geoshp` crates.
//!
//! This crate provides the feature model and the collaborator abstractions that
//! are shared between `geoshp-core` and the format implementation crates,
//! preventing circular dependencies.

pub mod drivers;
pub mod error;
pub mod io;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use drivers::{Driver, DriverCapabilities, Operation, SupportStatus};
pub use error::SchemaError;
pub use io::{DataReader, DataWriter, Dataset, RecordStream, WriteSummary};
pub use record::{Record, RecordRef, Value};
pub use schema::{Field, FieldKind, GeometryDescriptor, GeometryType, Schema};

//! ESRI Shapefile writer for `geoshp`.
//!
//! Encodes records whose schema has already been normalized (geometry first,
//! one of Point, MultiPoint, MultiLineString or MultiPolygon) into `.shp`,
//! `.shx` and `.dbf` files plus `.cpg` and `.prj` sidecars.

pub mod error;
pub mod shapes;
pub mod table;
pub mod writer;

pub use error::{ShapefileResult, ShapefileWriteError};
pub use shapes::SUPPORTED_GEOMETRY_TYPES;
pub use writer::{ShapefileWriter, ShapefileWriterOptions, WGS84_PRJ};

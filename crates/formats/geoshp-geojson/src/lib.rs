//! `GeoJSON` reader for `geoshp`.
//!
//! Reads a `GeoJSON` FeatureCollection, a single Feature, a bare Geometry, or a
//! newline-delimited `GeoJSON` sequence, and exposes it as a
//! [`geoshp_core_common::Dataset`]: one text, integer, float or boolean field
//! per property (sorted by name) followed by a single geometry field.

pub mod parser;
pub mod reader;

pub use parser::{FeatureRecord, ParsedDocument, parse_geojson_bytes};
pub use reader::{DEFAULT_CRS, GeoJsonReader, GeoJsonReaderOptions};

//! Data types reported by the `geoshp` operations.
//!
//! This module defines the structures used to describe a dataset, its
//! geometry columns and fields, and the outcome of a conversion.

use std::path::PathBuf;

use geoshp_core_common::{Field, Schema, SchemaError};

/// Information about a dataset.
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    /// Path to the dataset
    pub dataset: String,
    /// Driver name
    pub driver: String,
    /// Driver long name
    pub driver_long_name: String,
    /// Feature type name
    pub type_name: String,
    /// Geometry columns information
    pub geometry_columns: Vec<GeometryColumnInfo>,
    /// Schema fields
    pub fields: Vec<FieldInfo>,
    /// Layout the dataset would have as a shapefile
    pub output_layout: OutputLayout,
}

/// Information about a geometry column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryColumnInfo {
    /// Column name
    pub name: String,
    /// Geometry subtype
    pub geometry_type: String,
    /// CRS information
    pub crs: Option<String>,
}

/// Information about a field/column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Data type
    pub data_type: String,
    /// Whether the field is nullable
    pub nullable: bool,
    /// Maximum length of text values, if known
    pub max_length: Option<usize>,
}

/// Result of normalizing a dataset's schema for shapefile export.
#[derive(Debug, Clone)]
pub enum OutputLayout {
    /// The schema can be exported; these are the output fields in order.
    Normalized { fields: Vec<FieldInfo> },
    /// The schema cannot be exported.
    Rejected { reason: SchemaError },
}

impl OutputLayout {
    #[must_use]
    pub fn is_exportable(&self) -> bool {
        matches!(self, Self::Normalized { .. })
    }
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of features written
    pub features_written: usize,
    /// Files created by the output driver
    pub files: Vec<PathBuf>,
    /// Input geometry field and the name it was stored under
    pub geometry_rename: (String, String),
}

impl From<&Field> for FieldInfo {
    fn from(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            data_type: field.kind.to_string(),
            nullable: field.nullable,
            max_length: field.max_length,
        }
    }
}

impl GeometryColumnInfo {
    /// Collects the geometry columns of `schema`.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Vec<Self> {
        schema
            .geometry_fields()
            .filter_map(|field| {
                field.kind.as_geometry().map(|descriptor| Self {
                    name: field.name.clone(),
                    geometry_type: descriptor.geometry_type.to_string(),
                    crs: descriptor.crs.clone(),
                })
            })
            .collect()
    }
}

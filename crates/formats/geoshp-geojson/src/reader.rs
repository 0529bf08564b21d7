//! `GeoJSON` reader: schema inference and record conversion.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use geo_types::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon};
use geojson::JsonValue;
use geoshp_core_common::{
    DataReader, Dataset, Field, FieldKind, GeometryType, Record, Schema, Value,
};
use geoshp_format_shared::SpatialFormatReadError;
use log::{debug, info, warn};

use crate::parser::{FeatureRecord, describe_value, parse_geojson_bytes};

/// Reference system of documents that neither declare one nor get one from
/// [`GeoJsonReaderOptions::crs`].
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Options controlling `GeoJSON` reading behaviour.
#[derive(Debug, Clone)]
pub struct GeoJsonReaderOptions {
    /// Name of the geometry field in the produced schema.
    pub geometry_field_name: String,
    /// Feature type name; the file stem is used when unset.
    pub type_name: Option<String>,
    /// Promote single-part geometries to their multi-part family when that
    /// makes the collection homogeneous.
    pub promote_to_multi: bool,
    /// Reference system of the input. When set it wins over a `crs` member
    /// declared by the document.
    pub crs: Option<String>,
}

impl Default for GeoJsonReaderOptions {
    fn default() -> Self {
        Self {
            geometry_field_name: "geometry".to_string(),
            type_name: None,
            promote_to_multi: false,
            crs: None,
        }
    }
}

impl GeoJsonReaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_geometry_field_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_promote_to_multi(mut self, promote: bool) -> Self {
        self.promote_to_multi = promote;
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Option<String>) -> Self {
        self.crs = crs;
        self
    }
}

/// Reads `GeoJSON` documents and sequences into [`Dataset`]s.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonReader {
    options: GeoJsonReaderOptions,
}

impl GeoJsonReader {
    #[must_use]
    pub fn new(options: GeoJsonReaderOptions) -> Self {
        Self { options }
    }
}

impl DataReader for GeoJsonReader {
    fn open(&self, path: &Path) -> Result<Dataset> {
        let context = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|source| SpatialFormatReadError::Io {
                source,
                context: context.clone(),
            })
            .with_context(|| format!("Failed to open GeoJSON file '{context}'"))?;

        let document = parse_geojson_bytes(&bytes, context.as_str())?;
        info!(
            "Parsed {} GeoJSON feature(s) from {context}",
            document.records.len()
        );

        let type_name = self
            .options
            .type_name
            .clone()
            .or_else(|| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "features".to_string());
        let crs = resolve_crs(self.options.crs.as_deref(), document.crs.as_deref());

        let layout = infer_layout(&document.records, &self.options);
        let schema = layout.to_schema(type_name, crs)?;
        debug!("Inferred GeoJSON schema: {schema}");

        let records = document
            .records
            .into_iter()
            .map(move |feature| Ok::<_, anyhow::Error>(layout.convert(feature)));

        Ok(Dataset {
            schema,
            records: Box::new(records),
        })
    }
}

fn resolve_crs(requested: Option<&str>, declared: Option<&str>) -> String {
    match (requested, declared) {
        (Some(requested), Some(declared)) => {
            if requested != declared {
                warn!("Document declares CRS {declared}; using {requested} as requested");
            }
            requested.to_string()
        },
        (Some(crs), None) | (None, Some(crs)) => crs.to_string(),
        (None, None) => DEFAULT_CRS.to_string(),
    }
}

/// Returns `preferred`, or the first `preferred_<n>` no property uses.
fn free_geometry_name(
    preferred: &str,
    properties: &BTreeMap<String, InferredScalarType>,
) -> String {
    if !properties.contains_key(preferred) {
        return preferred.to_string();
    }
    let name = (1..)
        .map(|n| format!("{preferred}_{n}"))
        .find(|candidate| !properties.contains_key(candidate))
        .unwrap_or_default();
    warn!("Property '{preferred}' shadows the geometry column; reading geometries as '{name}'");
    name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InferredScalarType {
    Null,
    Boolean,
    Integer,
    Float,
    Text,
}

impl InferredScalarType {
    fn update(self, value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => self,
            JsonValue::Bool(_) => match self {
                Self::Null | Self::Boolean => Self::Boolean,
                _ => Self::Text,
            },
            JsonValue::Number(n) => {
                let is_int = n.is_i64();
                match self {
                    Self::Null | Self::Integer => {
                        if is_int {
                            Self::Integer
                        } else {
                            Self::Float
                        }
                    },
                    Self::Float => Self::Float,
                    _ => Self::Text,
                }
            },
            JsonValue::String(_) | JsonValue::Array(_) | JsonValue::Object(_) => Self::Text,
        }
    }

    fn to_kind(self) -> FieldKind {
        match self {
            Self::Null | Self::Text => FieldKind::Text,
            Self::Boolean => FieldKind::Boolean,
            Self::Integer => FieldKind::Integer,
            Self::Float => FieldKind::Float,
        }
    }
}

/// Schema layout inferred from a whole document, reused to convert each feature.
#[derive(Debug, Clone)]
struct Layout {
    properties: Vec<(String, FieldKind)>,
    geometry_field_name: String,
    geometry_type: GeometryType,
    geometry_nullable: bool,
    promote: bool,
}

fn infer_layout(records: &[FeatureRecord], options: &GeoJsonReaderOptions) -> Layout {
    let mut inferred: BTreeMap<String, InferredScalarType> = BTreeMap::new();

    for record in records {
        for (key, value) in &record.properties {
            let entry = inferred
                .entry(key.clone())
                .or_insert(InferredScalarType::Null);
            let updated = entry.update(value);
            if updated == InferredScalarType::Text && *entry != InferredScalarType::Text {
                debug!(
                    "Property '{key}' widened to text after a {} value",
                    describe_value(value)
                );
            }
            *entry = updated;
        }
    }

    let mut seen: Vec<GeometryType> = Vec::new();
    for geometry in records.iter().filter_map(|record| record.geometry.as_ref()) {
        let geometry_type = GeometryType::of(geometry);
        if !seen.contains(&geometry_type) {
            seen.push(geometry_type);
        }
    }

    let geometry_type = match seen.as_slice() {
        [] => GeometryType::Geometry,
        [only] if !options.promote_to_multi => *only,
        [first, ..] if options.promote_to_multi => {
            let family = first.to_multi();
            if seen.iter().all(|ty| ty.to_multi() == family) {
                family
            } else {
                GeometryType::Geometry
            }
        },
        _ => GeometryType::Geometry,
    };

    let geometry_field_name = free_geometry_name(&options.geometry_field_name, &inferred);
    Layout {
        properties: inferred
            .into_iter()
            .map(|(name, ty)| (name, ty.to_kind()))
            .collect(),
        geometry_field_name,
        geometry_type,
        geometry_nullable: records.iter().any(|record| record.geometry.is_none()),
        promote: options.promote_to_multi,
    }
}

impl Layout {
    fn to_schema(&self, type_name: String, crs: String) -> Result<Schema> {
        let mut fields: Vec<Field> = self
            .properties
            .iter()
            .map(|(name, kind)| Field::new(name.clone(), kind.clone()))
            .collect();
        fields.push(
            Field::geometry(self.geometry_field_name.clone(), self.geometry_type, Some(crs))
                .with_nullable(self.geometry_nullable),
        );
        Ok(Schema::try_new(type_name, fields)?)
    }

    fn convert(&self, feature: FeatureRecord) -> Record {
        let FeatureRecord {
            id,
            mut properties,
            geometry,
        } = feature;

        let mut values = BTreeMap::new();
        for (name, kind) in &self.properties {
            if let Some(value) = properties.remove(name) {
                values.insert(name.clone(), json_to_value(value, kind));
            }
        }

        let geometry = match geometry {
            Some(geometry) if self.promote => Value::Geometry(promote_to_multi(geometry)),
            Some(geometry) => Value::Geometry(geometry),
            None => Value::Null,
        };
        values.insert(self.geometry_field_name.clone(), geometry);

        Record::from_parts(id, values)
    }
}

fn json_to_value(value: JsonValue, kind: &FieldKind) -> Value {
    match (kind, value) {
        (_, JsonValue::Null) => Value::Null,
        (FieldKind::Integer, JsonValue::Number(n)) if n.is_i64() => {
            n.as_i64().map_or(Value::Null, Value::Integer)
        },
        (FieldKind::Float, JsonValue::Number(n)) => n.as_f64().map_or(Value::Null, Value::Float),
        (FieldKind::Boolean, JsonValue::Bool(b)) => Value::Boolean(b),
        (_, JsonValue::String(s)) => Value::Text(s),
        (_, other) => Value::Text(other.to_string()),
    }
}

/// Wraps single-part geometries in their multi-part counterpart.
fn promote_to_multi(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Point(point) => Geometry::MultiPoint(MultiPoint::new(vec![point])),
        Geometry::Line(line) => {
            Geometry::MultiLineString(MultiLineString::new(vec![LineString::from(line)]))
        },
        Geometry::LineString(line) => Geometry::MultiLineString(MultiLineString::new(vec![line])),
        Geometry::Polygon(polygon) => Geometry::MultiPolygon(MultiPolygon::new(vec![polygon])),
        Geometry::Rect(rect) => Geometry::MultiPolygon(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![triangle.to_polygon()]))
        },
        other => other,
    }
}

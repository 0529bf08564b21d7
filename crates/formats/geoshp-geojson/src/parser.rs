//! `GeoJSON` parsing helpers.

use std::convert::TryInto;
use std::fmt;

use geo_types::Geometry;
use geojson::feature::Id;
use geojson::{
    Feature, FeatureCollection, GeoJson, Geometry as GeoJsonGeometry, JsonObject, JsonValue,
};
use geoshp_format_shared::{SourcePosition, SpatialFormatReadError, SpatialFormatResult};

/// Parsed `GeoJSON` feature with materialized properties and geometry.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub id: Option<String>,
    pub properties: JsonObject,
    pub geometry: Option<Geometry<f64>>,
}

/// Features of a document plus the reference system it declares, if any.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub records: Vec<FeatureRecord>,
    /// CRS named by a legacy (2008 specification) `crs` member.
    pub crs: Option<String>,
}

/// Parse raw bytes as a `GeoJSON` document, falling back to a newline
/// delimited `GeoJSON` sequence.
pub fn parse_geojson_bytes(
    bytes: &[u8],
    context: impl Into<String>,
) -> SpatialFormatResult<ParsedDocument> {
    let context = context.into();
    let reader = std::io::Cursor::new(bytes);

    match GeoJson::from_reader(reader) {
        Ok(geojson) => {
            let crs = declared_crs(&geojson);
            let records = geojson_to_records(geojson, &context)?;
            Ok(ParsedDocument { records, crs })
        },
        Err(primary_err) => {
            let primary_err_message = primary_err.to_string();
            match parse_geojson_sequence(bytes, &context) {
                Ok(records) => Ok(ParsedDocument { records, crs: None }),
                Err(sequence_err) => {
                    Err(combine_errors(&primary_err_message, &sequence_err, context))
                },
            }
        },
    }
}

fn geojson_to_records(geojson: GeoJson, context: &str) -> SpatialFormatResult<Vec<FeatureRecord>> {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            feature_collection_to_records(collection, context)
        },
        GeoJson::Feature(feature) => Ok(vec![feature_to_record(feature, context, None)?]),
        GeoJson::Geometry(geometry) => {
            let geometry = convert_geometry(geometry, context, None)?;
            Ok(vec![FeatureRecord {
                id: None,
                properties: JsonObject::new(),
                geometry: Some(geometry),
            }])
        },
    }
}

fn feature_collection_to_records(
    collection: FeatureCollection,
    context: &str,
) -> SpatialFormatResult<Vec<FeatureRecord>> {
    collection
        .features
        .into_iter()
        .zip(1..)
        .map(|(feature, number)| {
            feature_to_record(feature, context, Some(SourcePosition::Feature(number)))
        })
        .collect()
}

fn feature_to_record(
    feature: Feature,
    context: &str,
    position: Option<SourcePosition>,
) -> SpatialFormatResult<FeatureRecord> {
    let geometry = match feature.geometry {
        Some(geometry) => Some(convert_geometry(geometry, context, position)?),
        None => None,
    };

    let id = feature.id.map(|id| match id {
        Id::String(id) => id,
        Id::Number(number) => number.to_string(),
    });

    Ok(FeatureRecord {
        id,
        properties: feature.properties.unwrap_or_default(),
        geometry,
    })
}

fn convert_geometry(
    geometry: GeoJsonGeometry,
    context: &str,
    position: Option<SourcePosition>,
) -> SpatialFormatResult<Geometry<f64>> {
    geometry
        .try_into()
        .map_err(|err| SpatialFormatReadError::Parse {
            message: format!("Failed to convert GeoJSON geometry: {err}"),
            position,
            context: context.to_string(),
        })
}

fn parse_geojson_sequence(bytes: &[u8], context: &str) -> SpatialFormatResult<Vec<FeatureRecord>> {
    let mut records = Vec::new();
    for (line_idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_number = (line_idx + 1) as u64;
        let line = match std::str::from_utf8(raw_line) {
            Ok(line) => line.trim(),
            Err(err) => {
                return Err(SpatialFormatReadError::Parse {
                    message: format!("GeoJSON line is not valid UTF-8: {err}"),
                    position: Some(SourcePosition::Line(line_number)),
                    context: context.to_string(),
                });
            },
        };

        // RFC 8142 record separators may prefix each entry.
        let line = line.trim_start_matches('\u{1e}');
        if line.is_empty() {
            continue;
        }

        let geojson = line
            .parse::<GeoJson>()
            .map_err(|err| SpatialFormatReadError::Parse {
                message: format!("Failed to parse GeoJSON feature: {err}"),
                position: Some(SourcePosition::Line(line_number)),
                context: context.to_string(),
            })?;

        let mut parsed = geojson_to_records(geojson, context)?;
        records.append(&mut parsed);
    }

    if records.is_empty() {
        Err(SpatialFormatReadError::Parse {
            message: "No GeoJSON features found".to_string(),
            position: None,
            context: context.to_string(),
        })
    } else {
        Ok(records)
    }
}

fn combine_errors(
    collection_err: &str,
    sequence_err: &SpatialFormatReadError,
    context: String,
) -> SpatialFormatReadError {
    let message = format!(
        "Failed to parse GeoJSON as a document ({collection_err}); \
         also failed to parse as GeoJSON sequence: {sequence_err}"
    );
    SpatialFormatReadError::Parse {
        message,
        position: None,
        context,
    }
}

/// Reads a legacy `"crs": {"type": "name", ...}` member.
fn declared_crs(geojson: &GeoJson) -> Option<String> {
    let foreign_members = match geojson {
        GeoJson::FeatureCollection(collection) => collection.foreign_members.as_ref(),
        GeoJson::Feature(feature) => feature.foreign_members.as_ref(),
        GeoJson::Geometry(geometry) => geometry.foreign_members.as_ref(),
    }?;
    let name = foreign_members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Some(normalize_crs_name(name))
}

/// Maps OGC URNs to `AUTHORITY:CODE` form.
pub(crate) fn normalize_crs_name(name: &str) -> String {
    if name.ends_with("CRS84") {
        return "EPSG:4326".to_string();
    }
    match name.strip_prefix("urn:ogc:def:crs:") {
        Some(rest) => {
            let mut parts = rest.split(':').filter(|part| !part.is_empty());
            match (parts.next(), parts.last()) {
                (Some(authority), Some(code)) => format!("{authority}:{code}"),
                _ => name.to_string(),
            }
        },
        None => name.to_string(),
    }
}

/// Helper to describe JSON value kinds for error messages.
pub(crate) fn describe_value(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geom = if self.geometry.is_some() {
            "Some(Geometry)"
        } else {
            "None"
        };
        write!(
            f,
            "FeatureRecord(id={}, properties={} keys, geometry={geom})",
            self.id.as_deref().unwrap_or("-"),
            self.properties.len()
        )
    }
}

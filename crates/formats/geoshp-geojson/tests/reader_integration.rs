use std::path::Path;

use anyhow::Result;
use geoshp_core_common::{DataReader, FieldKind, GeometryType, Value};
use geoshp_geojson::{GeoJsonReader, GeoJsonReaderOptions};

/// Reading a FeatureCollection yields properties sorted by name, geometry last
#[test]
fn test_read_parcels_schema() -> Result<()> {
    let reader = GeoJsonReader::default();
    let dataset = reader.open(Path::new("tests/data/parcels.geojson"))?;

    let names: Vec<&str> = dataset
        .schema
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["area", "owner", "zone", "geometry"]);
    assert_eq!(dataset.schema.type_name(), "parcels");

    let geometry = dataset.schema.field("geometry").unwrap();
    let descriptor = geometry.kind.as_geometry().unwrap();
    assert_eq!(descriptor.geometry_type, GeometryType::MultiPolygon);
    assert_eq!(descriptor.crs.as_deref(), Some("EPSG:4326"));
    assert_eq!(dataset.schema.field("zone").unwrap().kind, FieldKind::Integer);
    assert_eq!(dataset.schema.field("area").unwrap().kind, FieldKind::Float);

    let records: Vec<_> = dataset.records.collect::<Result<_>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), Some("parcel-1"));
    assert_eq!(records[1].get("owner"), Some(&Value::Text("Okafor".into())));
    Ok(())
}

/// A GeoJSON sequence with mixed Point/MultiPoint can be promoted to MultiPoint
#[test]
fn test_read_sequence_with_promotion() -> Result<()> {
    let path = Path::new("tests/data/cities.geojsonl");

    let plain = GeoJsonReader::default().open(path)?;
    let descriptor = plain.schema.field("geometry").unwrap().kind.as_geometry().cloned();
    assert_eq!(descriptor.unwrap().geometry_type, GeometryType::Geometry);

    let options = GeoJsonReaderOptions::default()
        .with_promote_to_multi(true)
        .with_geometry_field_name("geom");
    let promoted = GeoJsonReader::new(options).open(path)?;
    let descriptor = promoted.schema.field("geom").unwrap().kind.as_geometry().cloned();
    assert_eq!(descriptor.unwrap().geometry_type, GeometryType::MultiPoint);

    let records: Vec<_> = promoted.records.collect::<Result<_>>()?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id(), Some("1"));
    assert_eq!(records[2].get("population"), Some(&Value::Null));
    Ok(())
}

/// Missing files surface an error mentioning the path
#[test]
fn test_missing_file() {
    let err = GeoJsonReader::default()
        .open(Path::new("tests/data/does-not-exist.geojson"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("does-not-exist.geojson"));
}

/// Unparseable documents are rejected
#[test]
fn test_invalid_document() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.geojson");
    std::fs::write(&path, "{ not json")?;

    let err = GeoJsonReader::default().open(&path).unwrap_err();
    assert!(err.to_string().contains("Parse error"), "{err}");
    Ok(())
}

/// An explicitly requested CRS replaces the one the document declares
#[test]
fn test_requested_crs_overrides_document() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".geojson").tempfile()?;
    std::io::Write::write_all(
        &mut file,
        br#"{"type":"FeatureCollection",
  "crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::3857"}},
  "features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{}}]}"#,
    )?;

    let crs_of = |options: GeoJsonReaderOptions| -> Result<Option<String>> {
        let dataset = GeoJsonReader::new(options).open(file.path())?;
        let geometry = dataset.schema.field("geometry").unwrap();
        Ok(geometry.kind.as_geometry().and_then(|g| g.crs.clone()))
    };

    assert_eq!(crs_of(GeoJsonReaderOptions::default())?.as_deref(), Some("EPSG:3857"));
    let requested = GeoJsonReaderOptions::default().with_crs(Some("EPSG:2056".into()));
    assert_eq!(crs_of(requested)?.as_deref(), Some("EPSG:2056"));
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use geo_types::{Geometry, Point};
use geoshp_core_common::{DataReader, FieldKind, GeometryType, Value};
use geoshp_csv::{CsvReader, CsvReaderOptions};

/// Upper-case coordinate headers are detected and excluded from the attributes
#[test]
fn test_read_locations() -> Result<()> {
    let dataset = CsvReader::default().open(Path::new("tests/data/locations.csv"))?;

    let names: Vec<&str> = dataset
        .schema
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["the_geom", "CITY", "NUMBER"]);
    assert_eq!(dataset.schema.type_name(), "locations");

    let geometry = dataset.schema.fields()[0].kind.as_geometry().unwrap();
    assert_eq!(geometry.geometry_type, GeometryType::Point);
    assert_eq!(geometry.crs.as_deref(), Some("EPSG:4326"));

    let city = dataset.schema.field("CITY").unwrap();
    assert_eq!(city.kind, FieldKind::Text);
    assert_eq!(city.max_length, Some("Minneapolis".len()));
    assert_eq!(dataset.schema.field("NUMBER").unwrap().kind, FieldKind::Integer);

    let records: Vec<_> = dataset.records.collect::<Result<_>>()?;
    assert_eq!(records.len(), 15);
    assert_eq!(
        records[0].get("the_geom"),
        Some(&Value::Geometry(Geometry::Point(Point::new(
            11.116667, 46.066667
        ))))
    );
    assert_eq!(records[14].get("CITY"), Some(&Value::Text("Bonn".into())));
    assert_eq!(records[14].get("NUMBER"), Some(&Value::Integer(700)));
    Ok(())
}

/// Explicit coordinate columns and a custom delimiter
#[test]
fn test_explicit_columns_and_delimiter() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sites.csv");
    std::fs::write(&path, "site;northing;easting\nA;10.5;20.5\nB;11;21\n")?;

    let options = CsvReaderOptions::default()
        .with_delimiter(b';')
        .with_coordinate_columns("northing", "easting")
        .with_geometry_field_name("location")
        .with_type_name("Site");
    let dataset = CsvReader::new(options).open(&path)?;

    assert_eq!(dataset.schema.type_name(), "Site");
    assert_eq!(dataset.schema.fields()[0].name, "location");
    assert_eq!(dataset.schema.len(), 2);

    let records: Vec<_> = dataset.records.collect::<Result<_>>()?;
    assert_eq!(
        records[1].get("location"),
        Some(&Value::Geometry(Geometry::Point(Point::new(21.0, 11.0))))
    );
    Ok(())
}

/// Rows with fewer columns than the header are rejected with their line
#[test]
fn test_short_row_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("short.csv");
    std::fs::write(&path, "lat,lon,name\n1,2,a\n3,4\n")?;

    let dataset = CsvReader::default().open(&path)?;
    let err = dataset.records.collect::<Result<Vec<_>>>().unwrap_err();
    assert!(err.to_string().contains("line 3"), "{err}");
    assert!(err.to_string().contains("expected 3 columns"), "{err}");
    Ok(())
}

/// Missing files surface an I/O error
#[test]
fn test_missing_file() {
    let err = CsvReader::default()
        .open(Path::new("tests/data/does-not-exist.csv"))
        .unwrap_err();
    assert!(err.to_string().contains("I/O error"), "{err}");
}

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const CITIES: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","id":"oslo","geometry":{"type":"Point","coordinates":[10.75,59.91]},"properties":{"name":"Oslo"}},
  {"type":"Feature","id":"bergen","geometry":{"type":"Point","coordinates":[5.32,60.39]},"properties":{"name":"Bergen"}}
]}"#;

const RIVERS: &str = r#"{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{"name":"Glomma"}}"#;

fn geoshp() -> Command {
    Command::cargo_bin("geoshp").unwrap()
}

#[test]
fn test_drivers_lists_shapefile() {
    geoshp()
        .arg("drivers")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available Drivers"))
        .stdout(predicate::str::contains("ESRI Shapefile"))
        .stdout(predicate::str::contains("KML").not());
}

#[test]
fn test_convert_geojson() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cities.geojson");
    fs::write(&input, CITIES).unwrap();
    let output = dir.path().join("cities.shp");

    geoshp()
        .args(["convert", "--input-driver", "GeoJSON", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 feature(s)"))
        .stdout(predicate::str::contains(
            "Geometry column 'geometry' stored as 'the_geom'",
        ));

    for extension in ["shp", "shx", "dbf", "prj", "cpg"] {
        assert!(dir.path().join(format!("cities.{extension}")).exists());
    }
}

#[test]
fn test_convert_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cities.geojson");
    fs::write(&input, CITIES).unwrap();
    let output = dir.path().join("cities.shp");

    let run = |extra: &[&str]| {
        geoshp()
            .args(["convert", "--input-driver", "GeoJSON", "-i"])
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .args(extra)
            .assert()
    };

    run(&[]).success();
    run(&[])
        .failure()
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("--overwrite"));
    run(&["--overwrite", "--no-prj"]).success();
    assert!(!dir.path().join("cities.prj").exists());
}

#[test]
fn test_convert_unsupported_subtype_suggests_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rivers.geojson");
    fs::write(&input, RIVERS).unwrap();
    let output = dir.path().join("rivers.shp");

    geoshp()
        .args(["convert", "--input-driver", "GeoJSON", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported subtype LineString"))
        .stderr(predicate::str::contains("--promote-multi"));
    assert!(!output.exists());

    geoshp()
        .args(["convert", "--input-driver", "GeoJSON", "--promote-multi", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn test_convert_csv_with_columns() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sites.csv");
    fs::write(&input, "site;north;east\nA;59.9;10.7\nB;60.4;5.3\n").unwrap();

    geoshp()
        .args(["convert", "--input-driver", "CSV", "--delimiter", ";"])
        .args(["--lat-column", "north", "--lon-column", "east"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 feature(s)"));
    assert!(dir.path().join("sites.shp").exists());
}

#[test]
fn test_convert_unknown_driver() {
    geoshp()
        .args(["convert", "--input-driver", "Nope", "-i", "in.x", "-o", "out.shp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Driver 'Nope' not found."))
        .stderr(predicate::str::contains("geoshp drivers"));
}

#[test]
fn test_lat_column_requires_lon_column() {
    geoshp()
        .args(["info", "in.csv", "--driver", "CSV", "--lat-column", "y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--lon-column"));
}

#[test]
fn test_info_shows_layout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cities.geojson");
    fs::write(&input, CITIES).unwrap();

    geoshp()
        .args(["info", "--driver", "GeoJSON"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Geometry Columns ==="))
        .stdout(predicate::str::contains("=== Shapefile Layout ==="))
        .stdout(predicate::str::contains("the_geom"));
}

#[test]
fn test_info_reports_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rivers.geojson");
    fs::write(&input, RIVERS).unwrap();

    geoshp()
        .args(["info", "--driver", "GeoJSON"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not exportable"));
}

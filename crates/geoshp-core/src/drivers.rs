//! Driver registry and reader/writer factories.
//!
//! The registry lists the formats `geoshp` knows about, modeled after GDAL's
//! driver names, together with which operations are implemented. Drivers with
//! a supported operation can be turned into a [`DataReader`] or
//! [`DataWriter`] with [`create_reader`] and [`create_writer`].
//!
//! ```
//! use geoshp_core::drivers::{Operation, find_driver};
//!
//! let shapefile = find_driver("esri shapefile").expect("registered");
//! assert!(shapefile.supports(Operation::Write));
//! assert!(!shapefile.supports(Operation::Read));
//! ```

use geoshp_core_common::{DataReader, DataWriter};
use geoshp_csv::{CsvReader, CsvReaderOptions};
use geoshp_geojson::{GeoJsonReader, GeoJsonReaderOptions};
use geoshp_shapefile::{ShapefileWriter, ShapefileWriterOptions};

pub use geoshp_core_common::{Driver, DriverCapabilities, Operation, SupportStatus};

use crate::error::{DriverError, GeoShpError, Result, driver_not_found};
use crate::options::ConvertOptions;

/// Short name of the shapefile driver.
pub const SHAPEFILE_DRIVER: &str = "ESRI Shapefile";

/// Returns the complete registry of known vector format drivers.
#[must_use]
pub fn get_drivers() -> Vec<Driver> {
    use SupportStatus::{NotSupported, Planned, Supported};

    vec![
        Driver::new("GeoJSON", "GeoJSON", Supported, Supported, NotSupported),
        Driver::new(
            "GeoJSONSeq",
            "GeoJSONSeq: sequence of GeoJSON features",
            Supported,
            Supported,
            NotSupported,
        ),
        Driver::new(
            "CSV",
            "Comma Separated Value (.csv)",
            Supported,
            Supported,
            NotSupported,
        ),
        Driver::new(
            SHAPEFILE_DRIVER,
            "ESRI Shapefile / DBF",
            Planned,
            Planned,
            Supported,
        ),
        Driver::new("GPKG", "GeoPackage vector", Planned, Planned, NotSupported),
        Driver::new("FlatGeobuf", "FlatGeobuf", Planned, Planned, NotSupported),
        Driver::new(
            "GML",
            "Geography Markup Language",
            NotSupported,
            NotSupported,
            NotSupported,
        ),
        Driver::new(
            "KML",
            "Keyhole Markup Language",
            NotSupported,
            NotSupported,
            NotSupported,
        ),
    ]
}

/// Returns all drivers that have at least one fully supported operation.
#[must_use]
pub fn get_available_drivers() -> Vec<Driver> {
    get_drivers()
        .into_iter()
        .filter(|d| d.capabilities.has_supported_operation())
        .collect()
}

/// Finds a driver by its short name (case-insensitive).
#[must_use]
pub fn find_driver(name: &str) -> Option<Driver> {
    get_drivers()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Lists all drivers that fully support each requested capability.
///
/// A `false` argument means the operation is not required.
#[must_use]
pub fn list_drivers_with_capability(read: bool, write: bool, info: bool) -> Vec<Driver> {
    get_drivers()
        .into_iter()
        .filter(|d| {
            let read_ok = !read || d.capabilities.read.is_supported();
            let write_ok = !write || d.capabilities.write.is_supported();
            let info_ok = !info || d.capabilities.info.is_supported();
            read_ok && write_ok && info_ok
        })
        .collect()
}

/// Returns all driver short names in alphabetical order.
#[must_use]
pub fn get_driver_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_drivers().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}

/// Looks up `name` and checks that the driver implements `operation`.
///
/// # Errors
///
/// Returns [`DriverError::NotFound`] or [`DriverError::OperationNotSupported`].
pub fn resolve_driver(name: &str, operation: Operation) -> Result<Driver> {
    let driver = find_driver(name).ok_or_else(|| driver_not_found(name))?;
    ensure_supports(&driver, operation)?;
    Ok(driver)
}

/// Fails unless `driver` implements `operation`.
///
/// # Errors
///
/// Returns [`DriverError::OperationNotSupported`].
pub fn ensure_supports(driver: &Driver, operation: Operation) -> Result<()> {
    if driver.supports(operation) {
        Ok(())
    } else {
        Err(DriverError::OperationNotSupported {
            driver: driver.short_name.to_string(),
            operation: operation.to_string(),
        }
        .into())
    }
}

/// Creates the reader behind `driver`, configured from `options`.
///
/// # Errors
///
/// Fails when the driver has no reader.
pub fn create_reader(driver: &Driver, options: &ConvertOptions) -> Result<Box<dyn DataReader>> {
    match driver.short_name {
        "GeoJSON" | "GeoJSONSeq" => {
            let reader_options = GeoJsonReaderOptions::default()
                .with_promote_to_multi(options.promote_to_multi)
                .with_crs(options.crs.clone());
            Ok(Box::new(GeoJsonReader::new(reader_options)))
        },
        "CSV" => {
            let mut reader_options = CsvReaderOptions::default().with_delimiter(options.delimiter);
            if let (Some(latitude), Some(longitude)) =
                (&options.latitude_column, &options.longitude_column)
            {
                reader_options = reader_options.with_coordinate_columns(latitude, longitude);
            }
            if options.crs.is_some() {
                reader_options = reader_options.with_crs(options.crs.clone());
            }
            Ok(Box::new(CsvReader::new(reader_options)))
        },
        _ => Err(not_implemented(driver, Operation::Read)),
    }
}

/// Creates the writer behind `driver`, configured from `options`.
///
/// # Errors
///
/// Fails when the driver has no writer.
pub fn create_writer(driver: &Driver, options: &ConvertOptions) -> Result<Box<dyn DataWriter>> {
    match driver.short_name {
        SHAPEFILE_DRIVER => Ok(Box::new(ShapefileWriter::new(
            ShapefileWriterOptions::default()
                .with_overwrite(options.overwrite)
                .with_write_prj(options.write_prj),
        ))),
        _ => Err(not_implemented(driver, Operation::Write)),
    }
}

fn not_implemented(driver: &Driver, operation: Operation) -> GeoShpError {
    DriverError::OperationNotSupported {
        driver: driver.short_name.to_string(),
        operation: operation.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_driver() {
        let driver = find_driver("GeoJSON");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, "GeoJSON");
    }

    #[test]
    fn test_find_driver_case_insensitive() {
        let driver = find_driver("esri shapefile");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, SHAPEFILE_DRIVER);
    }

    #[test]
    fn test_list_read_and_write_drivers() {
        let readers = list_drivers_with_capability(true, false, false);
        let names: Vec<_> = readers.iter().map(|d| d.short_name).collect();
        assert_eq!(names, vec!["GeoJSON", "GeoJSONSeq", "CSV"]);

        let writers = list_drivers_with_capability(false, true, false);
        assert_eq!(writers.len(), 1);
        assert_eq!(writers[0].short_name, SHAPEFILE_DRIVER);

        assert!(list_drivers_with_capability(true, true, false).is_empty());
    }

    #[test]
    fn test_available_drivers() {
        let drivers = get_available_drivers();
        assert_eq!(drivers.len(), 4);
        assert!(!drivers.iter().any(|d| d.short_name == "KML"));
    }

    #[test]
    fn test_driver_names_sorted() {
        let names = get_driver_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&SHAPEFILE_DRIVER));
    }

    #[test]
    fn test_resolve_driver_checks_operation() {
        assert!(resolve_driver("csv", Operation::Read).is_ok());

        let err = resolve_driver("CSV", Operation::Write).unwrap_err();
        assert_eq!(err.to_string(), "Driver 'CSV' does not support writing");

        let err = resolve_driver("Nope", Operation::Read).unwrap_err();
        assert!(matches!(
            err,
            GeoShpError::Driver(DriverError::NotFound { .. })
        ));
    }

    #[test]
    fn test_factories_match_capabilities() {
        let options = ConvertOptions::default();
        for driver in get_drivers() {
            assert_eq!(
                create_reader(&driver, &options).is_ok(),
                driver.supports(Operation::Read),
                "{}",
                driver.short_name
            );
            assert_eq!(
                create_writer(&driver, &options).is_ok(),
                driver.supports(Operation::Write),
                "{}",
                driver.short_name
            );
        }
    }
}

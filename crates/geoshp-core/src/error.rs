//! Error types for `geoshp` operations.
//!
//! Collaborators (readers, writers) report failures through `anyhow`; the
//! operations in this crate classify them into [`GeoShpError`] so that the
//! CLI can show a precise message and a recovery suggestion.

use std::path::PathBuf;

use geoshp_core_common::SchemaError;
use geoshp_format_shared::{SourcePosition, SpatialFormatReadError};
use geoshp_shapefile::ShapefileWriteError;
use thiserror::Error;

/// Main error type for `geoshp` operations.
#[derive(Debug, Error)]
pub enum GeoShpError {
    /// The input schema or one of its records cannot be normalized
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Driver-related errors (not found, unsupported operations)
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// I/O errors (file read/write, path issues)
    #[error(transparent)]
    Io(#[from] IoError),

    /// Format parsing and encoding errors
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors with no more specific classification
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Driver-related errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver was not found in the registry
    #[error("Driver '{name}' not found. Available drivers: {available}")]
    NotFound {
        /// The requested driver name
        name: String,
        /// Comma-separated list of available drivers
        available: String,
    },

    /// Driver does not support the requested operation
    #[error("Driver '{driver}' does not support {operation}")]
    OperationNotSupported {
        /// The driver name
        driver: String,
        /// The operation that's not supported (e.g., "reading", "writing")
        operation: String,
    },
}

/// I/O related errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to read from a file
    #[error("Failed to read {format} file '{}': {source}", path.display())]
    Read {
        /// The format being read (e.g., "CSV", "`GeoJSON`")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write to a file
    #[error("Failed to write {format} file '{}': {source}", path.display())]
    Write {
        /// The format being written
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File was not found
    #[error("File not found: '{}'", path.display())]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
    },

    /// The output already exists
    #[error("Output already exists: '{}'", path.display())]
    OutputExists {
        /// The existing file
        path: PathBuf,
    },
}

fn location(line: Option<u64>, column: Option<u64>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!("line {line}, column {column}"),
        (Some(line), None) => format!("line {line}"),
        (None, _) => "line unknown".to_string(),
    }
}

/// Format parsing and encoding errors.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Failed to parse a format
    #[error("Failed to parse {format} at {}: {message}", location(*line, *column))]
    Parse {
        /// The format being parsed
        format: String,
        /// The line number where parsing failed (if available)
        line: Option<u64>,
        /// The 1-based column of a delimited format (if available)
        column: Option<u64>,
        /// Description of the parse error
        message: String,
    },

    /// Schema inference failed
    #[error("Schema inference failed for {format}: {reason}")]
    SchemaInference {
        /// The format
        format: String,
        /// Why schema inference failed
        reason: String,
    },

    /// A geometry cannot be encoded
    #[error("Invalid geometry in {format}: {message}")]
    InvalidGeometry {
        /// The format
        format: String,
        /// Description of the geometry problem, naming the record
        message: String,
    },

    /// An attribute value or column cannot be encoded
    #[error("Cannot encode attributes as {format}: {message}")]
    Attribute {
        /// The format
        format: String,
        /// Description of the problem
        message: String,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Options conflict with each other
    #[error("Conflicting options: {options}")]
    ConflictingOptions {
        /// Description of the conflicting options
        options: String,
    },
}

/// Type alias for Results using `GeoShpError`.
pub type Result<T> = std::result::Result<T, GeoShpError>;

impl GeoShpError {
    /// Classifies an error reported by a reader or writer collaborator.
    ///
    /// Schema errors keep their record and field details; known format errors
    /// are mapped to [`FormatError`] or [`IoError`] variants tagged with
    /// `format` and `path`.
    #[must_use]
    pub fn from_collaborator(err: anyhow::Error, format: &str, path: &std::path::Path) -> Self {
        let err = match err.downcast::<SchemaError>() {
            Ok(schema) => return Self::Schema(schema),
            Err(err) => err,
        };
        let err = match err.downcast::<SpatialFormatReadError>() {
            Ok(read) => return Self::from_read_error(read, format, path),
            Err(err) => err,
        };
        match err.downcast::<ShapefileWriteError>() {
            Ok(write) => Self::from_write_error(write, format),
            Err(err) => Self::Other(err),
        }
    }

    /// Classifies a writer failure. Anything [`from_collaborator`] cannot
    /// place that was caused by the file system becomes [`IoError::Write`].
    ///
    /// [`from_collaborator`]: Self::from_collaborator
    #[must_use]
    pub fn from_write_failure(err: anyhow::Error, format: &str, path: &std::path::Path) -> Self {
        match Self::from_collaborator(err, format, path) {
            Self::Other(err) if err.chain().any(|cause| cause.is::<std::io::Error>()) => {
                IoError::Write {
                    format: format.to_string(),
                    path: path.to_path_buf(),
                    source: err.into(),
                }
                .into()
            },
            classified => classified,
        }
    }

    fn from_read_error(err: SpatialFormatReadError, format: &str, path: &std::path::Path) -> Self {
        let format = format.to_string();
        match err {
            SpatialFormatReadError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                IoError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into()
            },
            SpatialFormatReadError::Io { source, .. } => IoError::Read {
                format,
                path: path.to_path_buf(),
                source: Box::new(source),
            }
            .into(),
            SpatialFormatReadError::Parse {
                message, position, ..
            } => FormatError::Parse {
                format,
                line: position.and_then(SourcePosition::line),
                column: position.and_then(SourcePosition::column),
                message,
            }
            .into(),
            SpatialFormatReadError::SchemaInference { message, .. } => {
                FormatError::SchemaInference {
                    format,
                    reason: message,
                }
                .into()
            },
        }
    }

    fn from_write_error(err: ShapefileWriteError, format: &str) -> Self {
        let format = format.to_string();
        match err {
            ShapefileWriteError::OutputExists { path } => IoError::OutputExists { path }.into(),
            ShapefileWriteError::GeometryMismatch { .. }
            | ShapefileWriteError::NullGeometry { .. }
            | ShapefileWriteError::InvalidGeometry { .. } => FormatError::InvalidGeometry {
                format,
                message: err.to_string(),
            }
            .into(),
            ShapefileWriteError::UnsupportedLayout { .. }
            | ShapefileWriteError::FieldNameCollision { .. }
            | ShapefileWriteError::ValueType { .. } => FormatError::Attribute {
                format,
                message: err.to_string(),
            }
            .into(),
        }
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Schema(e) => format!("Cannot export as a shapefile: {e}"),
            Self::Driver(e) => e.user_message(),
            Self::Io(e) => e.user_message(),
            Self::Format(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e:#}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Schema(e) => schema_suggestion(e),
            Self::Driver(e) => e.recovery_suggestion(),
            Self::Io(e) => e.recovery_suggestion(),
            Self::Format(e) => e.recovery_suggestion(),
            Self::Config(_) | Self::Other(_) => None,
        }
    }

    /// Check if this error might go away with different options.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Io(IoError::OutputExists { .. })
                | Self::Schema(SchemaError::UnsupportedGeometrySubtype { .. })
        )
    }
}

fn schema_suggestion(err: &SchemaError) -> Option<String> {
    match err {
        SchemaError::NoGeometryField => Some(
            "For CSV input, name the coordinate columns with --lat-column and --lon-column."
                .to_string(),
        ),
        SchemaError::MultipleGeometryFields { .. } => {
            Some("Shapefiles hold one geometry column; split the dataset first.".to_string())
        },
        SchemaError::UnsupportedGeometrySubtype { .. } => Some(
            "Use --promote-multi to store lines and polygons as their multi form.".to_string(),
        ),
        SchemaError::DuplicateField { name } => Some(format!(
            "Another field is already named '{name}'; store the geometry under a \
             different name with --geometry-name."
        )),
        SchemaError::MissingValue { .. } => None,
    }
}

impl DriverError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { name, available } => {
                format!(
                    "Driver '{name}' not found.\n\nAvailable drivers:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::OperationNotSupported { driver, operation } => {
                format!("The '{driver}' driver does not support {operation}.")
            },
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Run 'geoshp drivers' to see all available drivers.".to_string())
            },
            Self::OperationNotSupported { .. } => {
                Some("Try using a different driver that supports this operation.".to_string())
            },
        }
    }
}

impl IoError {
    fn user_message(&self) -> String {
        match self {
            Self::Read { format, path, source } => {
                format!("Failed to read {format} file {}: {source}", path.display())
            },
            Self::Write { format, path, source } => {
                format!("Failed to write {format} file {}: {source}", path.display())
            },
            Self::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            },
            Self::OutputExists { .. } => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check that the file path is correct and the file exists.".to_string())
            },
            Self::OutputExists { .. } => {
                Some("Pass --overwrite to replace the existing files.".to_string())
            },
            Self::Read { .. } | Self::Write { .. } => None,
        }
    }
}

impl FormatError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Parse { .. } => Some("Check the file format and ensure it's valid.".to_string()),
            Self::InvalidGeometry { .. } => {
                Some("Validate geometries using a GIS tool before exporting.".to_string())
            },
            Self::SchemaInference { .. } | Self::Attribute { .. } => None,
        }
    }
}

/// Helper to create `DriverError::NotFound` with available drivers.
#[must_use]
pub fn driver_not_found(name: &str) -> DriverError {
    use crate::drivers::get_driver_names;

    let available = get_driver_names().join(", ");
    DriverError::NotFound {
        name: name.to_string(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoshp_core_common::RecordRef;
    use std::path::Path;

    #[test]
    fn schema_errors_survive_anyhow() {
        let err = anyhow::Error::from(SchemaError::MissingValue {
            field: "geom".into(),
            record: RecordRef::Position(4),
        });
        let classified = GeoShpError::from_collaborator(err, "GeoJSON", Path::new("in.geojson"));

        assert!(matches!(
            classified,
            GeoShpError::Schema(SchemaError::MissingValue { .. })
        ));
        assert_eq!(
            classified.to_string(),
            "record #4 has no value for required field 'geom'"
        );
    }

    #[test]
    fn parse_errors_keep_their_line() {
        let err = anyhow::Error::from(SpatialFormatReadError::Parse {
            message: "bad number".into(),
            position: Some(SourcePosition::Line(12)),
            context: "in.csv".into(),
        });
        let classified = GeoShpError::from_collaborator(err, "CSV", Path::new("in.csv"));

        assert_eq!(
            classified.to_string(),
            "Failed to parse CSV at line 12: bad number"
        );
        assert!(classified.recovery_suggestion().is_some());
    }

    #[test]
    fn cell_errors_keep_their_column() {
        let err = anyhow::Error::from(SpatialFormatReadError::Parse {
            message: "'many' is not an integer".into(),
            position: Some(SourcePosition::Cell { line: 4, column: 3 }),
            context: "in.csv".into(),
        });
        let classified = GeoShpError::from_collaborator(err, "CSV", Path::new("in.csv"));

        assert!(matches!(
            classified,
            GeoShpError::Format(FormatError::Parse {
                line: Some(4),
                column: Some(3),
                ..
            })
        ));
        assert_eq!(
            classified.to_string(),
            "Failed to parse CSV at line 4, column 3: 'many' is not an integer"
        );
    }

    #[test]
    fn missing_input_is_file_not_found() {
        let err = anyhow::Error::from(SpatialFormatReadError::Io {
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
            context: "in.csv".into(),
        });
        let classified = GeoShpError::from_collaborator(err, "CSV", Path::new("gone.csv"));
        assert!(matches!(
            classified,
            GeoShpError::Io(IoError::FileNotFound { .. })
        ));
    }

    #[test]
    fn existing_output_suggests_overwrite() {
        let err = anyhow::Error::from(ShapefileWriteError::OutputExists {
            path: PathBuf::from("out.shp"),
        });
        let classified = GeoShpError::from_collaborator(err, "ESRI Shapefile", Path::new("out"));

        assert!(classified.is_recoverable());
        assert!(
            classified
                .recovery_suggestion()
                .unwrap()
                .contains("--overwrite")
        );
    }

    #[test]
    fn unknown_errors_are_kept() {
        let err = anyhow::anyhow!("disk on fire");
        let classified = GeoShpError::from_collaborator(err, "CSV", Path::new("in.csv"));
        assert!(matches!(classified, GeoShpError::Other(_)));
        assert_eq!(classified.user_message(), "Error: disk on fire");
    }

    #[test]
    fn driver_not_found_lists_drivers() {
        let err = GeoShpError::from(driver_not_found("KML"));
        let message = err.user_message();
        assert!(message.contains("Driver 'KML' not found."));
        assert!(message.contains("  - GeoJSON"));
        assert!(err.recovery_suggestion().unwrap().contains("geoshp drivers"));
    }

    #[test]
    fn file_system_write_failures_are_io_errors() {
        let err = anyhow::Error::from(std::io::Error::other("read-only file system"))
            .context("Failed to create 'out.shp'");
        let classified =
            GeoShpError::from_write_failure(err, "ESRI Shapefile", Path::new("out.shp"));

        assert!(matches!(classified, GeoShpError::Io(IoError::Write { .. })));
        assert_eq!(
            classified.to_string(),
            "Failed to write ESRI Shapefile file 'out.shp': Failed to create 'out.shp'"
        );

        let err = anyhow::anyhow!("unexpected");
        let classified = GeoShpError::from_write_failure(err, "ESRI Shapefile", Path::new("o"));
        assert!(matches!(classified, GeoShpError::Other(_)));
    }
}

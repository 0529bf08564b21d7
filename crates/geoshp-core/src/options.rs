//! Options shared by the conversion and inspection operations.

use crate::error::ConfigError;

/// Options for [`crate::operations::convert`] and [`crate::operations::inspect`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Canonical geometry name of the output (default: "the_geom")
    pub geometry_name: Option<String>,
    /// Promote single geometries to their multi form while reading (default: false)
    pub promote_to_multi: bool,
    /// CSV latitude column; detected from common names when unset
    pub latitude_column: Option<String>,
    /// CSV longitude column; detected from common names when unset
    pub longitude_column: Option<String>,
    /// CSV delimiter (default: b',')
    pub delimiter: u8,
    /// CRS of the input; wins over a CRS the input declares. Readers fall back
    /// to EPSG:4326 when neither is known
    pub crs: Option<String>,
    /// Replace an existing output (default: false)
    pub overwrite: bool,
    /// Write a `.prj` sidecar (default: true)
    pub write_prj: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            geometry_name: None,
            promote_to_multi: false,
            latitude_column: None,
            longitude_column: None,
            delimiter: b',',
            crs: None,
            overwrite: false,
            write_prj: true,
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_geometry_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_promote_to_multi(mut self, promote: bool) -> Self {
        self.promote_to_multi = promote;
        self
    }

    #[must_use]
    pub fn with_coordinate_columns(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        self.latitude_column = Some(latitude.into());
        self.longitude_column = Some(longitude.into());
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_write_prj(mut self, write_prj: bool) -> Self {
        self.write_prj = write_prj;
        self
    }

    /// Checks option values that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty geometry name or when only one
    /// of the coordinate columns is given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.geometry_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidOption {
                    option: "geometry-name".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if self.latitude_column.is_some() != self.longitude_column.is_some() {
            return Err(ConfigError::ConflictingOptions {
                options: "--lat-column and --lon-column must be given together".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses a single-character delimiter; `\t` and `tab` name the tab character.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] unless `value` is one ASCII character.
pub fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    let invalid = || ConfigError::InvalidOption {
        option: "delimiter".to_string(),
        message: format!("'{value}' is not a single ASCII character"),
    };
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(invalid()),
        },
    }
}

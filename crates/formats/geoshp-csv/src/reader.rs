//! CSV reader: latitude/longitude columns become a point geometry.
//!
//! The schema is inferred from a sample of rows in a first pass; records are
//! then streamed from a second pass over the file, one row at a time.

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use geo_types::{Geometry, Point};
use geoshp_core_common::{
    DataReader, Dataset, Field, FieldKind, GeometryType, Record, Schema, Value,
};
use geoshp_format_shared::{SourcePosition, SpatialFormatReadError};
use log::{debug, info, warn};

use crate::infer::{ColumnStats, convert_cell};

const LATITUDE_NAMES: &[&str] = &["latitude", "lat"];
const LONGITUDE_NAMES: &[&str] = &["longitude", "lon", "lng", "long"];

/// CSV reader configuration options
#[derive(Debug, Clone)]
pub struct CsvReaderOptions {
    /// The delimiter character (default: b',')
    pub delimiter: u8,
    /// Whether the CSV file has a header row (default: true)
    pub has_header: bool,
    /// Latitude column; detected from common names when unset
    pub latitude_column: Option<String>,
    /// Longitude column; detected from common names when unset
    pub longitude_column: Option<String>,
    /// Name of the point geometry field (default: "the_geom")
    pub geometry_field_name: String,
    /// Reference system of the coordinates (default: "EPSG:4326")
    pub crs: Option<String>,
    /// Maximum number of rows sampled for type inference
    pub schema_infer_max_rec: Option<usize>,
    /// Feature type name; the file stem is used when unset
    pub type_name: Option<String>,
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            latitude_column: None,
            longitude_column: None,
            geometry_field_name: "the_geom".to_string(),
            crs: Some("EPSG:4326".to_string()),
            schema_infer_max_rec: Some(1000),
            type_name: None,
        }
    }
}

impl CsvReaderOptions {
    /// Create new CSV reader options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter character
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the CSV has a header row
    #[must_use]
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the latitude and longitude column names
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

    /// Set the geometry field name
    #[must_use]
    pub fn with_geometry_field_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_field_name = name.into();
        self
    }

    /// Set the coordinate reference system
    #[must_use]
    pub fn with_crs(mut self, crs: Option<String>) -> Self {
        self.crs = crs;
        self
    }

    /// Set maximum records for schema inference
    #[must_use]
    pub fn with_schema_infer_max_rec(mut self, max_rec: Option<usize>) -> Self {
        self.schema_infer_max_rec = max_rec;
        self
    }

    /// Set the feature type name
    #[must_use]
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .trim(Trim::All)
            .flexible(true);
        builder
    }
}

/// Reads delimited text files with coordinate columns into [`Dataset`]s.
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvReaderOptions,
}

impl CsvReader {
    #[must_use]
    pub fn new(options: CsvReaderOptions) -> Self {
        Self { options }
    }
}

/// Column positions and field kinds resolved during the inference pass.
#[derive(Debug, Clone)]
struct RowLayout {
    column_count: usize,
    latitude: usize,
    longitude: usize,
    geometry_field_name: String,
    /// `(column index, field)` for every attribute column.
    attributes: Vec<(usize, Field)>,
}

impl DataReader for CsvReader {
    fn open(&self, path: &Path) -> Result<Dataset> {
        let context = path.display().to_string();
        let mut sample = self
            .options
            .reader_builder()
            .from_path(path)
            .map_err(|err| csv_error(err, &context))?;

        let headers = if self.options.has_header {
            sample
                .headers()
                .map_err(|err| csv_error(err, &context))?
                .iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        let sampled = sample_rows(&mut sample, self.options.schema_infer_max_rec, &context)?;
        let column_count = if headers.is_empty() {
            sampled.first().map_or(0, StringRecord::len)
        } else {
            headers.len()
        };
        let names: Vec<String> = if headers.is_empty() {
            (1..=column_count).map(|i| format!("column_{i}")).collect()
        } else {
            headers
        };

        let latitude = self.coordinate_column(
            &names,
            self.options.latitude_column.as_deref(),
            LATITUDE_NAMES,
            0,
            &context,
        )?;
        let longitude = self.coordinate_column(
            &names,
            self.options.longitude_column.as_deref(),
            LONGITUDE_NAMES,
            1,
            &context,
        )?;

        let mut stats = vec![ColumnStats::default(); column_count];
        for row in &sampled {
            for (idx, cell) in row.iter().enumerate().take(column_count) {
                stats[idx].observe(cell);
            }
        }

        let attributes: Vec<(usize, Field)> = names
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != latitude && *idx != longitude)
            .map(|(idx, name)| {
                let column = stats[idx];
                let kind = column.column_type.to_kind();
                let max_length =
                    (kind == FieldKind::Text && column.max_length > 0).then_some(column.max_length);
                (
                    idx,
                    Field::new(name.clone(), kind).with_max_length(max_length),
                )
            })
            .collect();

        let geometry_field_name = free_geometry_name(&self.options.geometry_field_name, &names);
        let mut fields = vec![
            Field::geometry(
                geometry_field_name.clone(),
                GeometryType::Point,
                self.options.crs.clone(),
            )
            .with_nullable(false),
        ];
        fields.extend(attributes.iter().map(|(_, field)| field.clone()));

        let type_name = self
            .options
            .type_name
            .clone()
            .or_else(|| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "locations".to_string());
        let schema = Schema::try_new(type_name, fields)?;
        info!(
            "Inferred CSV schema from {} sampled row(s) of {context}: {schema}",
            sampled.len()
        );

        let layout = RowLayout {
            column_count,
            latitude,
            longitude,
            geometry_field_name,
            attributes,
        };

        let rows = self
            .options
            .reader_builder()
            .from_path(path)
            .map_err(|err| csv_error(err, &context))?
            .into_records();
        let records = rows.filter_map(move |row| match row {
            Ok(row) if is_blank(&row) => None,
            Ok(row) => Some(layout.convert(&row, &context).map_err(anyhow::Error::from)),
            Err(err) => Some(Err(csv_error(err, &context).into())),
        });

        Ok(Dataset {
            schema,
            records: Box::new(records),
        })
    }
}

impl CsvReader {
    fn coordinate_column(
        &self,
        names: &[String],
        requested: Option<&str>,
        candidates: &[&str],
        headerless_default: usize,
        context: &str,
    ) -> Result<usize, SpatialFormatReadError> {
        let found = match requested {
            Some(requested) => names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(requested)),
            None => candidates.iter().find_map(|candidate| {
                names
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(candidate))
            }),
        };

        match found {
            Some(idx) => Ok(idx),
            None if requested.is_none()
                && !self.options.has_header
                && headerless_default < names.len() =>
            {
                Ok(headerless_default)
            },
            None => Err(SpatialFormatReadError::SchemaInference {
                message: format!(
                    "no {} column among [{}]",
                    requested.unwrap_or(candidates[0]),
                    names.join(", ")
                ),
                context: context.to_string(),
            }),
        }
    }
}

fn sample_rows(
    reader: &mut csv::Reader<File>,
    limit: Option<usize>,
    context: &str,
) -> Result<Vec<StringRecord>, SpatialFormatReadError> {
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| csv_error(err, context))?;
        if is_blank(&row) {
            continue;
        }
        rows.push(row);
        if limit.is_some_and(|max| rows.len() >= max) {
            break;
        }
    }
    debug!("Sampled {} CSV row(s) for type inference", rows.len());
    Ok(rows)
}

/// Returns `preferred`, or the first `preferred_<n>` that no column uses.
fn free_geometry_name(preferred: &str, names: &[String]) -> String {
    let taken = |candidate: &str| names.iter().any(|name| name == candidate);
    if !taken(preferred) {
        return preferred.to_string();
    }
    let name = (1..)
        .map(|n| format!("{preferred}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_default();
    warn!("Column '{preferred}' shadows the geometry column; storing points as '{name}'");
    name
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(str::is_empty)
}

impl RowLayout {
    fn convert(&self, row: &StringRecord, context: &str) -> Result<Record, SpatialFormatReadError> {
        let line = row.position().map_or(0, csv::Position::line);
        let parse_error =
            |message: String, position: SourcePosition| SpatialFormatReadError::Parse {
                message,
                position: Some(position),
                context: context.to_string(),
            };
        let cell_error = |idx: usize, message: String| {
            parse_error(
                message,
                SourcePosition::Cell {
                    line,
                    column: idx as u64 + 1,
                },
            )
        };

        if row.len() != self.column_count {
            return Err(parse_error(
                format!(
                    "expected {} columns, found {}",
                    self.column_count,
                    row.len()
                ),
                SourcePosition::Line(line),
            ));
        }

        let coordinate = |idx: usize, axis: &str| {
            let cell = row.get(idx).unwrap_or_default();
            cell.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| cell_error(idx, format!("{axis} '{cell}' is not a number")))
        };
        let latitude = coordinate(self.latitude, "latitude")?;
        let longitude = coordinate(self.longitude, "longitude")?;

        // Longitude is x, latitude is y.
        let mut record = Record::new().with_value(
            self.geometry_field_name.clone(),
            Value::Geometry(Geometry::Point(Point::new(longitude, latitude))),
        );
        for (idx, field) in &self.attributes {
            let cell = row.get(*idx).unwrap_or_default();
            let value = convert_cell(cell, &field.kind).map_err(|message| {
                cell_error(*idx, format!("column '{}': {message}", field.name))
            })?;
            record = record.with_value(field.name.clone(), value);
        }
        Ok(record)
    }
}

fn csv_error(err: csv::Error, context: &str) -> SpatialFormatReadError {
    let position = err.position().map(|pos| SourcePosition::Line(pos.line()));
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => SpatialFormatReadError::Io {
            source,
            context: context.to_string(),
        },
        _ => SpatialFormatReadError::Parse {
            message,
            position,
            context: context.to_string(),
        },
    }
}

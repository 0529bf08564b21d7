//! Shapefile writer with staged commit.
//!
//! Component files are encoded into a hidden staging directory created next to
//! the target. They are moved into place only once every record has been
//! written; on any error the staging directory is dropped and nothing is left
//! at the target.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geoshp_core_common::{
    DataWriter, FieldKind, GeometryDescriptor, Record, RecordRef, Schema, Value, WriteSummary,
};
use log::{debug, info, warn};

use crate::error::ShapefileWriteError;
use crate::shapes::{EncodedShape, SUPPORTED_GEOMETRY_TYPES, encode_geometry};
use crate::table::{MAX_CHARACTER_WIDTH, TableLayout};

/// ESRI WKT for WGS 84 longitude/latitude.
pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Encoding declared in the `.cpg` sidecar.
const CODE_PAGE: &str = "UTF-8";

/// Extensions of every file this writer may produce.
const COMPONENT_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Options for shapefile writing
#[derive(Debug, Clone)]
pub struct ShapefileWriterOptions {
    /// Replace existing component files (default: false)
    pub overwrite: bool,
    /// Write a `.prj` file when the CRS is known (default: true)
    pub write_prj: bool,
    /// Width of text columns without a maximum length (default: 254)
    pub default_text_width: usize,
}

impl Default for ShapefileWriterOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            write_prj: true,
            default_text_width: MAX_CHARACTER_WIDTH,
        }
    }
}

impl ShapefileWriterOptions {
    /// Create new writer options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether existing files are replaced
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set whether a `.prj` file is written
    #[must_use]
    pub fn with_write_prj(mut self, write_prj: bool) -> Self {
        self.write_prj = write_prj;
        self
    }

    /// Set the width of unbounded text columns
    #[must_use]
    pub fn with_default_text_width(mut self, width: usize) -> Self {
        self.default_text_width = width;
        self
    }
}

/// Writes normalized records as an ESRI Shapefile.
#[derive(Debug, Clone, Default)]
pub struct ShapefileWriter {
    options: ShapefileWriterOptions,
}

impl ShapefileWriter {
    #[must_use]
    pub fn new(options: ShapefileWriterOptions) -> Self {
        Self { options }
    }
}

impl DataWriter for ShapefileWriter {
    fn write(
        &self,
        path: &Path,
        schema: &Schema,
        records: &mut dyn Iterator<Item = Result<Record>>,
    ) -> Result<WriteSummary> {
        let (geometry_name, descriptor) = geometry_column(schema)?;
        let mut table =
            TableLayout::from_fields(&schema.fields()[1..], self.options.default_text_width)?;

        let target = target_path(path, schema);
        let target_dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = target
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .with_context(|| format!("Output path '{}' has no file name", target.display()))?;

        if !self.options.overwrite {
            for extension in COMPONENT_EXTENSIONS {
                let existing = target.with_extension(extension);
                if existing.exists() {
                    return Err(ShapefileWriteError::OutputExists { path: existing }.into());
                }
            }
        }

        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create directory '{}'", target_dir.display()))?;
        let staging = tempfile::Builder::new()
            .prefix(".geoshp-")
            .tempdir_in(&target_dir)
            .with_context(|| {
                format!("Failed to create staging directory in '{}'", target_dir.display())
            })?;
        let staged_shp = staging.path().join(format!("{stem}.shp"));
        debug!("Staging shapefile at {}", staged_shp.display());

        let mut writer = shapefile::Writer::from_path(&staged_shp, table.table_builder()?)
            .with_context(|| format!("Failed to create '{}'", staged_shp.display()))?;

        let mut features_written = 0;
        for (position, record) in records.enumerate() {
            let record = record?;
            let record_ref = RecordRef::for_record(record.id(), position);
            let shape = match record.get(geometry_name) {
                Some(Value::Geometry(geometry)) => {
                    encode_geometry(geometry, descriptor.geometry_type, &record_ref)?
                },
                _ => return Err(ShapefileWriteError::NullGeometry { record: record_ref }.into()),
            };
            let row = table.to_row(&record, &record_ref)?;

            let written = match &shape {
                EncodedShape::Point(shape) => writer.write_shape_and_record(shape, &row),
                EncodedShape::Multipoint(shape) => writer.write_shape_and_record(shape, &row),
                EncodedShape::Polyline(shape) => writer.write_shape_and_record(shape, &row),
                EncodedShape::Polygon(shape) => writer.write_shape_and_record(shape, &row),
            };
            written.with_context(|| format!("Failed to encode {record_ref}"))?;
            features_written += 1;
        }
        // Dropping the writer completes the file headers.
        drop(writer);

        let mut staged_files = vec![
            staged_shp.clone(),
            staged_shp.with_extension("shx"),
            staged_shp.with_extension("dbf"),
        ];

        let cpg = staged_shp.with_extension("cpg");
        fs::write(&cpg, CODE_PAGE).with_context(|| format!("Failed to write '{}'", cpg.display()))?;
        staged_files.push(cpg);

        if self.options.write_prj {
            match prj_for(descriptor.crs.as_deref()) {
                Some(wkt) => {
                    let prj = staged_shp.with_extension("prj");
                    fs::write(&prj, wkt)
                        .with_context(|| format!("Failed to write '{}'", prj.display()))?;
                    staged_files.push(prj);
                },
                None => warn!(
                    "No projection file written for CRS {}",
                    descriptor.crs.as_deref().unwrap_or("<unknown>")
                ),
            }
        }

        let files = commit(&staged_files, &target, self.options.overwrite)?;
        info!(
            "Wrote {features_written} feature(s) to {}",
            target.display()
        );

        Ok(WriteSummary {
            features_written,
            files,
        })
    }
}

/// Validates that the first field is the layer geometry and returns it.
fn geometry_column(schema: &Schema) -> Result<(&str, &GeometryDescriptor), ShapefileWriteError> {
    let layout_error = |message: String| ShapefileWriteError::UnsupportedLayout { message };

    let first = schema
        .fields()
        .first()
        .ok_or_else(|| layout_error("schema has no fields".to_string()))?;
    let FieldKind::Geometry(descriptor) = &first.kind else {
        return Err(layout_error(format!(
            "first field '{}' is not a geometry field",
            first.name
        )));
    };
    if !SUPPORTED_GEOMETRY_TYPES.contains(&descriptor.geometry_type) {
        return Err(layout_error(format!(
            "geometry type {} is not one of Point, MultiPoint, MultiLineString, MultiPolygon",
            descriptor.geometry_type
        )));
    }
    Ok((first.name.as_str(), descriptor))
}

/// Resolves the `.shp` path: directories receive `<type name>.shp`.
fn target_path(path: &Path, schema: &Schema) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{}.shp", schema.type_name()))
    } else {
        path.with_extension("shp")
    }
}

/// WKT for the `.prj` sidecar, when the CRS is one the writer can express.
#[must_use]
pub fn prj_for(crs: Option<&str>) -> Option<&str> {
    let crs = crs?.trim();
    let upper = crs.to_ascii_uppercase();
    if matches!(upper.as_str(), "EPSG:4326" | "OGC:CRS84" | "CRS84" | "WGS84") {
        return Some(WGS84_PRJ);
    }
    ["GEOGCS[", "PROJCS[", "GEOGCRS[", "PROJCRS["]
        .iter()
        .any(|prefix| upper.starts_with(prefix))
        .then_some(crs)
}

/// Moves staged files next to `target`, returning their final paths.
///
/// Components of an earlier output that the new one does not replace are
/// removed only once every staged file is in place.
fn commit(staged: &[PathBuf], target: &Path, overwrite: bool) -> Result<Vec<PathBuf>> {
    let mut committed = Vec::with_capacity(staged.len());
    for file in staged {
        let Some(extension) = file.extension() else {
            continue;
        };
        let destination = target.with_extension(extension);
        fs::rename(file, &destination).with_context(|| {
            format!(
                "Failed to move '{}' to '{}'",
                file.display(),
                destination.display()
            )
        })?;
        committed.push(destination);
    }

    if overwrite {
        for extension in COMPONENT_EXTENSIONS {
            let stale = target.with_extension(extension);
            if !committed.contains(&stale) && stale.exists() {
                fs::remove_file(&stale)
                    .with_context(|| format!("Failed to remove '{}'", stale.display()))?;
            }
        }
    }
    Ok(committed)
}

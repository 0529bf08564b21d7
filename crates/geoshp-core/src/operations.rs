//! Core operations: converting a dataset to a shapefile and inspecting it.
//!
//! Both operations resolve their collaborators from the driver registry,
//! then hand the input schema to the [`SchemaNormalizer`]. Conversion streams
//! the normalized records straight into the writer, one record at a time.

use std::path::Path;

use geoshp_core_common::{Operation, Schema};
use geoshp_format_shared::SpatialFormatReadError;
use log::{debug, info};

use crate::drivers::{Driver, create_reader, create_writer, ensure_supports};
use crate::error::{GeoShpError, Result};
use crate::normalize::SchemaNormalizer;
use crate::options::ConvertOptions;
use crate::types::{ConversionSummary, DatasetInfo, FieldInfo, GeometryColumnInfo, OutputLayout};

/// Converts the dataset at `input` and writes it to `output`.
///
/// The input schema is normalized before the output is created, so schema
/// errors leave the output untouched. Records are then read, normalized and
/// written one at a time; the first failing record aborts the conversion and
/// the writer discards everything written so far.
///
/// # Errors
///
/// This function will return an error if:
/// - the options are invalid
/// - `input_driver` cannot read or `output_driver` cannot write
/// - the input cannot be opened or its schema cannot be normalized
/// - a record is missing a required value, or cannot be encoded
pub fn convert(
    input: &Path,
    output: &Path,
    input_driver: &Driver,
    output_driver: &Driver,
    options: &ConvertOptions,
) -> Result<ConversionSummary> {
    info!("Starting conversion:");
    info!("Input: {} (Driver: {})", input.display(), input_driver.short_name);
    info!("Output: {} (Driver: {})", output.display(), output_driver.short_name);

    options.validate()?;
    ensure_supports(input_driver, Operation::Read)?;
    ensure_supports(output_driver, Operation::Write)?;

    let reader = create_reader(input_driver, options)?;
    let writer = create_writer(output_driver, options)?;

    let dataset = reader
        .open(input)
        .map_err(|err| GeoShpError::from_collaborator(err, input_driver.short_name, input))?;
    info!("Input schema: {}", dataset.schema);

    let original_geometry = geometry_name(&dataset.schema);
    let (schema, mut records) =
        normalizer_for(options).normalize_stream(&dataset.schema, dataset.records)?;
    info!("Output schema: {schema}");

    let written = writer.write(output, &schema, &mut records).map_err(|err| {
        // Reader failures surface through the record stream.
        if err.is::<SpatialFormatReadError>() {
            GeoShpError::from_collaborator(err, input_driver.short_name, input)
        } else {
            GeoShpError::from_write_failure(err, output_driver.short_name, output)
        }
    })?;
    debug!("Read {} record(s) from the input", records.records_read());
    info!(
        "Wrote {} feature(s) to {} file(s)",
        written.features_written,
        written.files.len()
    );

    let canonical = schema
        .fields()
        .first()
        .map(|field| field.name.clone())
        .unwrap_or_default();
    Ok(ConversionSummary {
        features_written: written.features_written,
        files: written.files,
        geometry_rename: (original_geometry, canonical),
    })
}

/// Describes the dataset at `input` and the shapefile layout it would get.
///
/// Only the schema is read; the records are never consumed. A schema that
/// cannot be exported is reported in [`DatasetInfo::output_layout`] rather
/// than as an error.
///
/// # Errors
///
/// Returns an error if `driver` does not provide dataset information or the
/// input cannot be opened.
pub fn inspect(input: &Path, driver: &Driver, options: &ConvertOptions) -> Result<DatasetInfo> {
    info!("Inspecting {} (Driver: {})", input.display(), driver.short_name);

    options.validate()?;
    ensure_supports(driver, Operation::Info)?;

    let reader = create_reader(driver, options)?;
    let dataset = reader
        .open(input)
        .map_err(|err| GeoShpError::from_collaborator(err, driver.short_name, input))?;
    let schema = dataset.schema;

    let output_layout = match normalizer_for(options).derive_output_schema(&schema) {
        Ok((output, _)) => OutputLayout::Normalized {
            fields: output.fields().iter().map(FieldInfo::from).collect(),
        },
        Err(reason) => {
            debug!("Schema {schema} cannot be exported: {reason}");
            OutputLayout::Rejected { reason }
        },
    };

    Ok(DatasetInfo {
        dataset: input.display().to_string(),
        driver: driver.short_name.to_string(),
        driver_long_name: driver.long_name.to_string(),
        type_name: schema.type_name().to_string(),
        geometry_columns: GeometryColumnInfo::from_schema(&schema),
        fields: schema.fields().iter().map(FieldInfo::from).collect(),
        output_layout,
    })
}

fn normalizer_for(options: &ConvertOptions) -> SchemaNormalizer {
    let normalizer = SchemaNormalizer::shapefile();
    match &options.geometry_name {
        Some(name) => normalizer.with_canonical_geometry_name(name.clone()),
        None => normalizer,
    }
}

fn geometry_name(schema: &Schema) -> String {
    schema
        .geometry_fields()
        .next()
        .map(|field| field.name.clone())
        .unwrap_or_default()
}

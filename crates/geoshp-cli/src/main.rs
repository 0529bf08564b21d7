//! Command-line interface for `geoshp`, which exports vector datasets as ESRI
//! Shapefiles.
//!
//! This binary provides a thin CLI over the [`geoshp_core`] library.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging, and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `convert` - Export a dataset as a shapefile
//! - `info` - Display a dataset's schema and its shapefile layout
//! - `drivers` - List all available format drivers and their capabilities

mod display;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoshp_core::drivers::{self, Operation, SHAPEFILE_DRIVER};
use geoshp_core::operations;
use geoshp_core::options::parse_delimiter;
use geoshp_core::{ConvertOptions, GeoShpError};

#[derive(Parser)]
#[command(
    name = "geoshp",
    version,
    about = "Export vector datasets as ESRI Shapefiles",
    long_about = "geoshp normalizes the schema of a vector dataset for the shapefile format \
                  (one geometry column, stored first as 'the_geom') and streams its \
                  features into a .shp/.shx/.dbf set."
)]
/// Command-line arguments and options for the `geoshp` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options that control how the input is read and normalized.
#[derive(Args, Debug, Default)]
struct ReadArgs {
    /// Store single-part geometries in their multi-part form (e.g. LineString
    /// as MultiLineString).
    #[arg(long)]
    promote_multi: bool,

    /// CSV column holding the latitude (detected when omitted).
    #[arg(long, value_name = "COLUMN", requires = "lon_column")]
    lat_column: Option<String>,

    /// CSV column holding the longitude (detected when omitted).
    #[arg(long, value_name = "COLUMN", requires = "lat_column")]
    lon_column: Option<String>,

    /// CSV field delimiter; use "tab" or "\t" for tabs.
    #[arg(long, value_name = "CHAR", default_value = ",")]
    delimiter: String,

    /// Coordinate reference system of the input. Overrides a CRS declared by
    /// a GeoJSON document (default: the declared CRS, else EPSG:4326).
    #[arg(long, value_name = "CRS")]
    crs: Option<String>,

    /// Name of the geometry column in the output.
    #[arg(long, value_name = "NAME")]
    geometry_name: Option<String>,
}

/// Available subcommands for the `geoshp` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Converts a vector dataset into an ESRI Shapefile.
    Convert {
        /// Path to the input geospatial dataset.
        #[arg(short, long, value_name = "DATASET")]
        input: PathBuf,

        /// Path of the output `.shp` file, or a directory to write into.
        #[arg(short, long, value_name = "DATASET")]
        output: PathBuf,

        /// The driver to use for reading the input dataset (e.g., "`GeoJSON`", "CSV").
        #[arg(long, value_name = "DRIVER")]
        input_driver: String,

        /// The driver to use for writing the output dataset.
        #[arg(long, value_name = "DRIVER", default_value = SHAPEFILE_DRIVER)]
        output_driver: String,

        #[command(flatten)]
        read: ReadArgs,

        /// Replace existing output files.
        #[arg(long)]
        overwrite: bool,

        /// Do not write a `.prj` projection file.
        #[arg(long)]
        no_prj: bool,
    },

    /// Displays a dataset's schema and the layout it would have as a shapefile.
    Info {
        /// Path to the input geospatial dataset.
        #[arg(value_name = "DATASET")]
        input: PathBuf,

        /// The driver to use for reading the dataset.
        #[arg(long, value_name = "DRIVER")]
        driver: String,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Lists all available drivers and their capabilities.
    Drivers,
}

/// Entry point for the `geoshp` command-line interface.
///
/// # Errors
///
/// Returns an error if the logging system cannot be initialized. Command
/// failures are reported on standard error with a non-zero exit status.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            input_driver,
            output_driver,
            read,
            overwrite,
            no_prj,
        } => {
            info!("Converting {} to {}", input.display(), output.display());
            convert_options(&read)
                .map(|options| options.with_overwrite(overwrite).with_write_prj(!no_prj))
                .and_then(|options| {
                    handle_convert(&input, &output, &input_driver, &output_driver, &options)
                })
        },
        Commands::Info {
            input,
            driver,
            read,
        } => {
            info!("Displaying info for {}", input.display());
            convert_options(&read).and_then(|options| handle_info(&input, &driver, &options))
        },
        Commands::Drivers => {
            handle_drivers();
            Ok(())
        },
    };

    if let Err(err) = result {
        report(&err);
        std::process::exit(1);
    }
    Ok(())
}

fn report(err: &GeoShpError) {
    debug!("{err:?}");
    eprintln!("{}", err.user_message());
    if let Some(suggestion) = err.recovery_suggestion() {
        eprintln!("\nSuggestion: {suggestion}");
    }
}

fn convert_options(read: &ReadArgs) -> geoshp_core::Result<ConvertOptions> {
    let mut options = ConvertOptions::new()
        .with_promote_to_multi(read.promote_multi)
        .with_delimiter(parse_delimiter(&read.delimiter)?);
    if let (Some(lat), Some(lon)) = (&read.lat_column, &read.lon_column) {
        options = options.with_coordinate_columns(lat, lon);
    }
    if let Some(crs) = &read.crs {
        options = options.with_crs(crs);
    }
    if let Some(name) = &read.geometry_name {
        options = options.with_geometry_name(name);
    }
    options.validate()?;
    Ok(options)
}

fn handle_convert(
    input: &std::path::Path,
    output: &std::path::Path,
    input_driver_name: &str,
    output_driver_name: &str,
    options: &ConvertOptions,
) -> geoshp_core::Result<()> {
    info!("Input driver: {input_driver_name}");
    info!("Output driver: {output_driver_name}");

    let input_driver = drivers::resolve_driver(input_driver_name, Operation::Read)?;
    let output_driver = drivers::resolve_driver(output_driver_name, Operation::Write)?;

    let summary = operations::convert(input, output, &input_driver, &output_driver, options)?;

    let (original, canonical) = &summary.geometry_rename;
    println!(
        "Wrote {} feature(s) to {}",
        summary.features_written,
        output.display()
    );
    if original != canonical {
        println!("Geometry column '{original}' stored as '{canonical}'");
    }
    for file in &summary.files {
        debug!("Created {}", file.display());
    }
    info!("Conversion complete.");
    Ok(())
}

fn handle_info(
    input: &std::path::Path,
    driver_name: &str,
    options: &ConvertOptions,
) -> geoshp_core::Result<()> {
    let driver = drivers::resolve_driver(driver_name, Operation::Info)?;
    let info = operations::inspect(input, &driver, options)?;
    display::display_dataset_info(&info);
    Ok(())
}

/// Handles the `drivers` subcommand by displaying a formatted table of
/// available drivers.
fn handle_drivers() {
    let drivers = drivers::get_available_drivers();

    println!("\nAvailable Drivers ({} total):\n", drivers.len());
    println!("{}", display::drivers_table(&drivers));
}

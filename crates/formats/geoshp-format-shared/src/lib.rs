//! Read errors shared by the `geoshp` format readers.
//!
//! Readers return [`SpatialFormatReadError`] through `anyhow` so the core can
//! downcast it and attribute the failure to the input file.

use std::fmt;

use thiserror::Error;

/// Where in the input a read failure happened. Numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePosition {
    /// A whole line, e.g. a malformed CSV row or `GeoJSON` sequence entry.
    Line(u64),
    /// One cell of a delimited row.
    Cell { line: u64, column: u64 },
    /// A feature of a `GeoJSON` collection, counted from the first.
    Feature(u64),
}

impl SourcePosition {
    /// The line, when the position has one.
    #[must_use]
    pub fn line(self) -> Option<u64> {
        match self {
            Self::Line(line) | Self::Cell { line, .. } => Some(line),
            Self::Feature(_) => None,
        }
    }

    /// The column, for cell positions.
    #[must_use]
    pub fn column(self) -> Option<u64> {
        match self {
            Self::Cell { column, .. } => Some(column),
            Self::Line(_) | Self::Feature(_) => None,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "line {line}"),
            Self::Cell { line, column } => write!(f, "line {line}, column {column}"),
            Self::Feature(feature) => write!(f, "feature {feature}"),
        }
    }
}

/// Failure while opening or streaming an input dataset.
#[derive(Debug, Error)]
pub enum SpatialFormatReadError {
    /// The source could not be read.
    #[error("I/O error while reading {context}: {source}")]
    Io {
        source: std::io::Error,
        /// The file or stream being read.
        context: String,
    },

    /// The source is not valid for its format.
    #[error("Parse error while reading {context}{}: {message}", at(*position))]
    Parse {
        message: String,
        position: Option<SourcePosition>,
        context: String,
    },

    /// No usable schema could be derived from the source.
    #[error("Schema inference error while reading {context}: {message}")]
    SchemaInference { message: String, context: String },
}

fn at(position: Option<SourcePosition>) -> String {
    position.map(|position| format!(" at {position}")).unwrap_or_default()
}

/// Result alias for reader internals.
pub type SpatialFormatResult<T> = Result<T, SpatialFormatReadError>;

//! Reader and writer collaborator traits.
//!
//! Format crates implement these traits; the core drives them without knowing
//! anything about the underlying encodings.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::record::Record;
use crate::schema::Schema;

/// Lazily produced records of a dataset.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>> + Send>;

/// An opened dataset: its schema plus a single-pass stream of records.
pub struct Dataset {
    pub schema: Schema,
    pub records: RecordStream,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Trait for reading features from a geospatial format.
pub trait DataReader: Send + Sync {
    /// Opens the dataset at `path`, inferring its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its schema cannot be
    /// determined.
    fn open(&self, path: &Path) -> Result<Dataset>;
}

/// Outcome of a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of features persisted
    pub features_written: usize,
    /// Every file created by the writer
    pub files: Vec<PathBuf>,
}

/// Trait for writing features to a geospatial format.
///
/// Writers own their output resources and either persist every record or
/// leave no output behind.
pub trait DataWriter: Send + Sync {
    /// Writes `records`, which conform to `schema`, to `path`.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `records` or by the encoding; in
    /// that case nothing is committed at `path`.
    fn write(
        &self,
        path: &Path,
        schema: &Schema,
        records: &mut dyn Iterator<Item = Result<Record>>,
    ) -> Result<WriteSummary>;
}

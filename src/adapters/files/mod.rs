//! Flat-file adapters: CSV cohort tables, JSON model artifacts and CSV
//! reports.
//!
//! Nothing here is transactional. Each save overwrites its target file.

mod artifacts;
mod cohort;
mod report;

pub use artifacts::{
    FsArtifactStore, FEATURE_NAMES_FILE, METADATA_FILE, MODEL_FILE, SCALER_FILE,
};
pub use cohort::{read_records, write_records, CsvCohortStore, TEST_FILE, TRAIN_FILE};
pub use report::{report_file_name, write_assessment_report, write_predictions};

use std::path::PathBuf;

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Missing file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema mismatch: {0}")]
    Schema(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

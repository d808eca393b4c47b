//! Cohort port: Trait for reading and writing labelled patient tables.
//!
//! The training and held-out tables are stored separately and never mixed.

use crate::domain::PatientRecord;

/// Which of the two disjoint tables to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => f.pad("train"),
            Self::Test => f.pad("test"),
        }
    }
}

/// Trait for cohort table storage.
pub trait CohortStore: Send + Sync {
    /// Error type for cohort operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write a table, replacing any previous contents.
    ///
    /// # Errors
    /// Returns error if the table cannot be written.
    fn save_split(&self, split: Split, records: &[PatientRecord]) -> Result<(), Self::Error>;

    /// Read every row of a table.
    ///
    /// # Errors
    /// Returns error if the table is missing or a row is malformed.
    fn load_split(&self, split: Split) -> Result<Vec<PatientRecord>, Self::Error>;

    /// Check whether a table exists.
    fn has_split(&self, split: Split) -> bool;
}

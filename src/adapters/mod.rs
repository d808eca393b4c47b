//! Adapters layer: Concrete implementations of ports.
//!
//! - `ml`: in-crate classifiers and the feature scaler
//! - `files`: CSV cohort tables, JSON model artifacts, CSV reports
//! - `sanitize`: identifier filtering for logs

pub mod files;
pub mod ml;
pub mod sanitize;

// Re-export storage error for lib.rs
pub use files::StorageError;

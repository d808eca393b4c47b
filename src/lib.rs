//! # Fallwatch
//!
//! Six-month fall-risk assessment for older adults.
//!
//! This crate provides:
//! - A seeded synthetic cohort generator driven by a hand-weighted risk score
//! - Classifier training and AUC-based model selection
//! - Single-patient and batch inference with contributing factors and care plans
//! - Terminal UI for interactive assessment
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patients, risk function, assessments, metrics)
//! - `ports`: Trait definitions for classifiers and flat-file storage
//! - `adapters`: Concrete implementations (classifiers, CSV/JSON files, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Assessment, PatientFeatures, PatientRecord, RiskCategory};

/// Result type for Fallwatch operations
pub type Result<T> = std::result::Result<T, FallwatchError>;

/// Main error type for Fallwatch
#[derive(Debug, thiserror::Error)]
pub enum FallwatchError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Evaluation failed: {0}")]
    Metrics(#[from] domain::MetricsError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model artifact missing: {0}")]
    MissingArtifact(String),

    #[error("Cohort table not found: {0}")]
    CohortMissing(String),

    #[error("Cohort is empty: {0}")]
    EmptyCohort(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

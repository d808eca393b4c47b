//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (learners, flat files).

mod artifacts;
mod classifier;
mod cohort;

pub use artifacts::ArtifactStore;
pub use classifier::{check_training_data, normalize_importances, Classifier, ModelError};
pub use cohort::{CohortStore, Split};

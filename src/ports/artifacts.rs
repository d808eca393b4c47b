//! Artifact port: Trait for persisting the trained model bundle.
//!
//! A bundle is the fitted classifier, the fitted scaler, the ordered feature
//! list and the evaluation metadata. It is written once after training and
//! loaded read-only by the inference layer.

use crate::adapters::ml::ModelArtifacts;

/// Trait for model artifact storage.
pub trait ArtifactStore: Send + Sync {
    /// Error type for artifact operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist all four artifacts.
    ///
    /// # Errors
    /// Returns error if any artifact cannot be written.
    fn save(&self, artifacts: &ModelArtifacts) -> Result<(), Self::Error>;

    /// Load and cross-check all four artifacts.
    ///
    /// # Errors
    /// Returns error if any artifact is missing, unreadable or inconsistent
    /// with the others.
    fn load(&self) -> Result<ModelArtifacts, Self::Error>;
}

//! JSON model artifacts in a model directory.
//!
//! Four files, written together after training:
//! - `fall_risk_model.json`: tagged fitted classifier
//! - `scaler.json`: per-column mean and scale
//! - `feature_names.json`: ordered feature list
//! - `metadata.json`: held-out metrics and sample counts

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::StorageError;
use crate::adapters::ml::{FittedModel, ModelArtifacts, StandardScaler};
use crate::domain::ModelMetadata;
use crate::ports::ArtifactStore;

pub const MODEL_FILE: &str = "fall_risk_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const METADATA_FILE: &str = "metadata.json";

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Model artifacts stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of all four artifacts.
    #[must_use]
    pub fn paths(&self) -> [PathBuf; 4] {
        [MODEL_FILE, SCALER_FILE, FEATURE_NAMES_FILE, METADATA_FILE].map(|f| self.dir.join(f))
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|e| StorageError::io(path, e))
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, StorageError> {
        let bytes = self.read_bytes(name)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, bytes).map_err(|e| StorageError::io(path, e))
    }
}

impl ArtifactStore for FsArtifactStore {
    type Error = StorageError;

    fn save(&self, artifacts: &ModelArtifacts) -> Result<(), StorageError> {
        artifacts
            .check_consistency()
            .map_err(StorageError::Schema)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        self.write_json(MODEL_FILE, &artifacts.model)?;
        self.write_json(SCALER_FILE, &artifacts.scaler)?;
        self.write_json(FEATURE_NAMES_FILE, &artifacts.feature_names)?;
        self.write_json(METADATA_FILE, &artifacts.metadata)?;

        tracing::info!(
            "Saved {} artifacts to {:?}",
            artifacts.metadata.model_type,
            self.dir
        );
        Ok(())
    }

    fn load(&self) -> Result<ModelArtifacts, StorageError> {
        // Report every missing file at once rather than the first.
        let missing: Vec<String> = self
            .paths()
            .iter()
            .filter(|p| !p.is_file())
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StorageError::NotFound(PathBuf::from(missing.join(", "))));
        }

        let model_bytes = self.read_bytes(MODEL_FILE)?;
        let fingerprint = sha256_hex_bytes(&model_bytes);
        let model: FittedModel = serde_json::from_slice(&model_bytes)?;
        let scaler: StandardScaler = self.read_json(SCALER_FILE)?;
        let feature_names: Vec<String> = self.read_json(FEATURE_NAMES_FILE)?;
        let metadata: ModelMetadata = self.read_json(METADATA_FILE)?;

        let artifacts = ModelArtifacts {
            model,
            scaler,
            feature_names,
            metadata,
            fingerprint: Some(fingerprint),
        };
        artifacts
            .check_consistency()
            .map_err(StorageError::Schema)?;

        tracing::info!(
            "Loaded {} from {:?} (n_features={}, auc={:.3})",
            artifacts.metadata.model_type,
            self.dir,
            artifacts.feature_names.len(),
            artifacts.metadata.auc
        );
        Ok(artifacts)
    }
}

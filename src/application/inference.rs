//! Inference service: run the trained model on patient intake data.
//!
//! Artifacts are loaded once into an immutable, shared handle. Every call
//! takes `&self`, so the service can be cloned freely across the UI and
//! batch paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ndarray::Array2;

use crate::adapters::ml::ModelArtifacts;
use crate::adapters::StorageError;
use crate::domain::risk::fall_probability;
use crate::domain::{
    Assessment, Gender, ModelMetadata, PatientFeatures, PatientRecord, Prediction, FEATURE_NAMES,
};
use crate::ports::{ArtifactStore, Classifier};
use crate::FallwatchError;

/// Patient ID attached to simulator assessments.
pub const SIMULATION_ID: &str = "SIMULATION";

/// Reduced input for the what-if simulator.
///
/// Every other feature is fixed: BMI 27, muscle strength 5, cognitive
/// score 7, two home hazards, male, and no conditions, medications flags,
/// walking aid or living alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorInput {
    pub age: u32,
    pub gait_speed: f64,
    pub balance_score: f64,
    pub previous_falls: u32,
    pub num_medications: u32,
    pub activity_level: f64,
}

impl Default for SimulatorInput {
    fn default() -> Self {
        Self {
            age: 75,
            gait_speed: 5.0,
            balance_score: 5.0,
            previous_falls: 0,
            num_medications: 3,
            activity_level: 5.0,
        }
    }
}

impl SimulatorInput {
    #[must_use]
    pub fn to_features(&self) -> PatientFeatures {
        PatientFeatures {
            age: self.age,
            gender: Gender::Male,
            bmi: 27.0,
            gait_speed: self.gait_speed,
            balance_score: self.balance_score,
            muscle_strength: 5.0,
            previous_falls: self.previous_falls,
            num_medications: self.num_medications,
            takes_sedatives: false,
            takes_blood_pressure_meds: false,
            has_arthritis: false,
            has_osteoporosis: false,
            has_parkinsons: false,
            has_diabetes: false,
            vision_impairment: false,
            cognitive_score: 7.0,
            uses_walking_aid: false,
            lives_alone: false,
            home_hazards: 2,
            activity_level: self.activity_level,
        }
    }
}

/// Service for scoring patients with a loaded model.
#[derive(Clone)]
pub struct InferenceService {
    artifacts: Arc<ModelArtifacts>,
}

impl InferenceService {
    /// Load artifacts from a store and check them against the feature schema.
    ///
    /// # Errors
    /// `MissingArtifact` if any artifact file is missing, `SchemaMismatch` if
    /// the artifacts disagree with each other or with the expected schema,
    /// `Storage` for any other read failure.
    pub fn load<A>(store: &A) -> Result<Self, FallwatchError>
    where
        A: ArtifactStore,
        A::Error: Into<StorageError>,
    {
        let artifacts = store.load().map_err(|e| match e.into() {
            StorageError::NotFound(path) => {
                FallwatchError::MissingArtifact(format!("missing {}", path.display()))
            }
            StorageError::Schema(msg) => FallwatchError::SchemaMismatch(msg),
            other => FallwatchError::Storage(other),
        })?;
        Self::from_artifacts(artifacts)
    }

    /// Wrap in-memory artifacts.
    ///
    /// # Errors
    /// `SchemaMismatch` if the artifacts are inconsistent or their feature
    /// list is not the expected schema.
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, FallwatchError> {
        artifacts
            .check_consistency()
            .map_err(FallwatchError::SchemaMismatch)?;

        if artifacts.feature_names.len() != FEATURE_NAMES.len()
            || artifacts
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(a, b)| a != b)
        {
            return Err(FallwatchError::SchemaMismatch(format!(
                "persisted feature list [{}] differs from expected [{}]",
                artifacts.feature_names.join(", "),
                FEATURE_NAMES.join(", ")
            )));
        }

        tracing::info!(
            "Inference ready: {} (auc={:.3}, {} features)",
            artifacts.metadata.model_type,
            artifacts.metadata.auc,
            artifacts.feature_names.len()
        );
        Ok(Self {
            artifacts: Arc::new(artifacts),
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.artifacts.metadata
    }

    /// SHA-256 of the model file, if loaded from disk.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.artifacts.fingerprint.as_deref()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.artifacts.feature_names
    }

    fn predict_matrix(&self, x: &Array2<f64>) -> Result<Vec<Prediction>, FallwatchError> {
        let scaled = self.artifacts.scaler.transform(x)?;
        let proba = self.artifacts.model.predict_proba(&scaled)?;
        Ok(proba.iter().map(|&p| Prediction::new(p, p >= 0.5)).collect())
    }

    /// Predict from caller-named columns in any order.
    ///
    /// # Errors
    /// `SchemaMismatch` on a missing, unexpected or duplicate column, or a
    /// names/values length mismatch. `Validation` on a non-finite value.
    pub fn predict_named(&self, names: &[&str], values: &[f64]) -> Result<Prediction, FallwatchError> {
        if names.len() != values.len() {
            return Err(FallwatchError::SchemaMismatch(format!(
                "{} column names but {} values",
                names.len(),
                values.len()
            )));
        }

        let mut by_name = HashMap::with_capacity(names.len());
        for (&name, &value) in names.iter().zip(values) {
            if by_name.insert(name, value).is_some() {
                return Err(FallwatchError::SchemaMismatch(format!(
                    "duplicate column '{name}'"
                )));
            }
        }

        let expected: HashSet<&str> = self.feature_names().iter().map(String::as_str).collect();
        let unexpected: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !expected.contains(n))
            .collect();
        if !unexpected.is_empty() {
            return Err(FallwatchError::SchemaMismatch(format!(
                "unexpected columns: {}",
                unexpected.join(", ")
            )));
        }

        let missing: Vec<&str> = self
            .feature_names()
            .iter()
            .map(String::as_str)
            .filter(|n| !by_name.contains_key(n))
            .collect();
        if !missing.is_empty() {
            return Err(FallwatchError::SchemaMismatch(format!(
                "missing columns: {}",
                missing.join(", ")
            )));
        }

        let mut row = Vec::with_capacity(self.feature_names().len());
        for name in self.feature_names() {
            let value = by_name[name.as_str()];
            if !value.is_finite() {
                return Err(FallwatchError::Validation(format!(
                    "{name} is not a finite number"
                )));
            }
            row.push(value);
        }

        let scaled = self.artifacts.scaler.transform_row(&row)?;
        let proba = self.artifacts.model.predict_proba(&scaled)?;
        let p = proba[0];
        Ok(Prediction::new(p, p >= 0.5))
    }

    /// Predict for one patient without range validation.
    ///
    /// # Errors
    /// Returns error if the model rejects the input.
    pub fn predict(&self, features: &PatientFeatures) -> Result<Prediction, FallwatchError> {
        let named = features.named_values();
        let names: Vec<&str> = named.iter().map(|(n, _)| *n).collect();
        let values: Vec<f64> = named.iter().map(|(_, v)| *v).collect();
        self.predict_named(&names, &values)
    }

    /// Full assessment for one patient.
    ///
    /// # Errors
    /// `Validation` if any intake value is out of range.
    pub fn assess(
        &self,
        patient_id: &str,
        features: PatientFeatures,
    ) -> Result<Assessment, FallwatchError> {
        features
            .validate()
            .map_err(|errors| FallwatchError::Validation(errors.join("; ")))?;

        let prediction = self.predict(&features)?;
        let reference = fall_probability(&features);
        let assessment = Assessment::new(patient_id, features, prediction, reference);

        tracing::info!(
            "Assessed {}: p={:.3} category={} urgency={}",
            assessment.patient_id,
            assessment.prediction.probability,
            assessment.category,
            assessment.urgency
        );
        Ok(assessment)
    }

    /// Assess every row of a cohort table in one model pass.
    ///
    /// # Errors
    /// `Validation` naming the first out-of-range row.
    pub fn assess_batch(&self, records: &[PatientRecord]) -> Result<Vec<Assessment>, FallwatchError> {
        let features: Vec<PatientFeatures> = records.iter().map(PatientRecord::features).collect();
        for (record, f) in records.iter().zip(&features) {
            f.validate().map_err(|errors| {
                FallwatchError::Validation(format!("{}: {}", record.patient_id, errors.join("; ")))
            })?;
        }

        let mut x = Array2::zeros((features.len(), FEATURE_NAMES.len()));
        for (mut row, f) in x.rows_mut().into_iter().zip(&features) {
            for (cell, value) in row.iter_mut().zip(f.to_vec()) {
                *cell = value;
            }
        }
        let predictions = self.predict_matrix(&x)?;

        let assessments: Vec<Assessment> = records
            .iter()
            .zip(features)
            .zip(predictions)
            .map(|((record, f), prediction)| {
                let reference = fall_probability(&f);
                Assessment::new(record.patient_id.clone(), f, prediction, reference)
            })
            .collect();

        tracing::info!("Assessed batch of {} patients", assessments.len());
        Ok(assessments)
    }

    /// What-if assessment from the reduced simulator input.
    ///
    /// # Errors
    /// `Validation` if a slider value is out of range.
    pub fn simulate(&self, input: &SimulatorInput) -> Result<Assessment, FallwatchError> {
        let features = input.to_features();
        features
            .validate()
            .map_err(|errors| FallwatchError::Validation(errors.join("; ")))?;
        let prediction = self.predict(&features)?;
        let reference = fall_probability(&features);
        Ok(Assessment::new(SIMULATION_ID, features, prediction, reference))
    }

    /// Model feature importances paired with names, largest first.
    ///
    /// # Errors
    /// Returns error if the model cannot report importances.
    pub fn feature_importances(&self) -> Result<Vec<(String, f64)>, FallwatchError> {
        let values = self.artifacts.model.feature_importances()?;
        let mut named: Vec<(String, f64)> = self
            .feature_names()
            .iter()
            .cloned()
            .zip(values)
            .collect();
        named.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::files::{FsArtifactStore, FEATURE_NAMES_FILE, MODEL_FILE};
    use crate::adapters::ml::{FittedModel, LogisticConfig, LogisticRegression, StandardScaler};
    use crate::application::training::{design_matrix, labels};
    use crate::application::CohortGenerator;
    use crate::domain::{EvaluationMetrics, RiskCategory, TOP_FACTORS};
    use tempfile::tempdir;

    fn trained_artifacts() -> ModelArtifacts {
        let (train, test) = CohortGenerator::new(42).generate_split(300, 100);
        let x = design_matrix(&train);
        let scaler = StandardScaler::fit(&x).expect("scaler");
        let mut model = FittedModel::LogisticRegression(LogisticRegression::new(LogisticConfig {
            max_iter: 500,
            ..LogisticConfig::default()
        }));
        model
            .fit(&scaler.transform(&x).expect("scale"), &labels(&train))
            .expect("fit");

        let proba = model
            .predict_proba(&scaler.transform(&design_matrix(&test)).expect("scale"))
            .expect("proba");
        let metrics = EvaluationMetrics::evaluate(&labels(&test), &proba.to_vec()).expect("auc");
        let names: Vec<String> = FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect();
        ModelArtifacts {
            metadata: ModelMetadata::new(model.name(), &metrics, names.clone(), 300, 100),
            model,
            scaler,
            feature_names: names,
            fingerprint: None,
        }
    }

    fn service() -> InferenceService {
        InferenceService::from_artifacts(trained_artifacts()).expect("service")
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        store.save(&trained_artifacts()).expect("save");

        let svc = InferenceService::load(&store).expect("load");
        assert_eq!(svc.metadata().model_type, "Logistic Regression");
        assert_eq!(svc.fingerprint().map(str::len), Some(64));
    }

    #[test]
    fn test_missing_artifact_names_path() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        store.save(&trained_artifacts()).expect("save");
        std::fs::remove_file(dir.path().join(MODEL_FILE)).expect("remove");

        match InferenceService::load(&store) {
            Err(FallwatchError::MissingArtifact(msg)) => assert!(msg.contains(MODEL_FILE)),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load should fail"),
        }
    }

    #[test]
    fn test_reordered_schema_rejected() {
        let mut artifacts = trained_artifacts();
        artifacts.feature_names.swap(0, 1);
        artifacts.metadata.feature_names.swap(0, 1);
        assert!(matches!(
            InferenceService::from_artifacts(artifacts),
            Err(FallwatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_tampered_feature_file_rejected() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        store.save(&trained_artifacts()).expect("save");
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names[19] = "age";
        std::fs::write(
            dir.path().join(FEATURE_NAMES_FILE),
            serde_json::to_string(&names).expect("json"),
        )
        .expect("write");

        assert!(matches!(
            InferenceService::load(&store),
            Err(FallwatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_predict_named_aligns_columns() {
        let svc = service();
        let features = PatientFeatures::sample();
        let direct = svc.predict(&features).expect("predict");

        let mut named = features.named_values();
        named.reverse();
        let names: Vec<&str> = named.iter().map(|(n, _)| *n).collect();
        let values: Vec<f64> = named.iter().map(|(_, v)| *v).collect();
        let aligned = svc.predict_named(&names, &values).expect("predict");
        assert!((direct.probability - aligned.probability).abs() < 1e-12);
    }

    #[test]
    fn test_predict_named_schema_errors() {
        let svc = service();
        let named = PatientFeatures::default().named_values();
        let names: Vec<&str> = named.iter().map(|(n, _)| *n).collect();
        let values: Vec<f64> = named.iter().map(|(_, v)| *v).collect();

        // missing
        assert!(matches!(
            svc.predict_named(&names[1..], &values[1..]),
            Err(FallwatchError::SchemaMismatch(msg)) if msg.contains("age")
        ));

        // unexpected
        let mut extra_names = names.clone();
        extra_names.push("risk_score");
        let mut extra_values = values.clone();
        extra_values.push(40.0);
        assert!(matches!(
            svc.predict_named(&extra_names, &extra_values),
            Err(FallwatchError::SchemaMismatch(msg)) if msg.contains("risk_score")
        ));

        // duplicate
        let mut dup_names = names.clone();
        dup_names.push("bmi");
        let mut dup_values = values.clone();
        dup_values.push(30.0);
        assert!(matches!(
            svc.predict_named(&dup_names, &dup_values),
            Err(FallwatchError::SchemaMismatch(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_assess() {
        let svc = service();
        let features = PatientFeatures::sample();
        let assessment = svc.assess("PT0042", features.clone()).expect("assess");

        assert_eq!(
            assessment.category,
            RiskCategory::from_probability(assessment.prediction.probability)
        );
        assert!((assessment.reference_probability - fall_probability(&features)).abs() < 1e-12);
        assert!(assessment.factors.len() <= TOP_FACTORS);
        assert!(assessment.confidence() >= 0.5);
    }

    #[test]
    fn test_assess_rejects_out_of_range() {
        let invalid = PatientFeatures {
            age: 50,
            ..Default::default()
        };
        assert!(matches!(
            service().assess("PT0001", invalid),
            Err(FallwatchError::Validation(_))
        ));
    }

    #[test]
    fn test_batch_matches_single() {
        let svc = service();
        let records = CohortGenerator::new(77).generate(25);
        let batch = svc.assess_batch(&records).expect("batch");
        assert_eq!(batch.len(), 25);
        for (record, assessment) in records.iter().zip(&batch) {
            assert_eq!(assessment.patient_id, record.patient_id);
            let single = svc.predict(&record.features()).expect("predict");
            assert!((single.probability - assessment.prediction.probability).abs() < 1e-9);
        }
    }

    #[test]
    fn test_simulator_defaults() {
        let f = SimulatorInput::default().to_features();
        assert!((f.bmi - 27.0).abs() < 1e-12);
        assert!((f.muscle_strength - 5.0).abs() < 1e-12);
        assert!((f.cognitive_score - 7.0).abs() < 1e-12);
        assert_eq!(f.home_hazards, 2);
        assert_eq!(f.gender, Gender::Male);
        assert!(!f.uses_walking_aid && !f.has_parkinsons && !f.lives_alone);

        let assessment = service()
            .simulate(&SimulatorInput {
                age: 88,
                previous_falls: 3,
                ..SimulatorInput::default()
            })
            .expect("simulate");
        assert_eq!(assessment.patient_id, SIMULATION_ID);
        assert_eq!(assessment.features.age, 88);
    }

    #[test]
    fn test_feature_importances_sorted() {
        let importances = service().feature_importances().expect("importances");
        assert_eq!(importances.len(), FEATURE_NAMES.len());
        for pair in importances.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        let total: f64 = importances.iter().map(|(_, v)| v).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}

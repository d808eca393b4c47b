//! Training service: fit candidate classifiers and keep the best by AUC.
//!
//! Pipeline:
//! - encode both tables into the fixed feature schema
//! - fit the scaler on the training table only
//! - fit every candidate and score it on the held-out table
//! - keep the highest held-out AUC (ties go to the earlier candidate)
//! - persist model, scaler, feature list and metadata together

use std::sync::Arc;

use ndarray::Array2;

use crate::adapters::ml::{FittedModel, ModelArtifacts, StandardScaler};
use crate::domain::{EvaluationMetrics, ModelMetadata, PatientRecord, FEATURE_NAMES, N_FEATURES};
use crate::ports::{ArtifactStore, Classifier, CohortStore, Split};
use crate::FallwatchError;

/// Importances logged and reported after selection.
pub const TOP_FEATURES: usize = 10;

/// Encode records into a design matrix in `FEATURE_NAMES` column order.
///
/// `risk_score`, `risk_category` and the identifier never enter the matrix.
#[must_use]
pub fn design_matrix(records: &[PatientRecord]) -> Array2<f64> {
    let mut x = Array2::zeros((records.len(), N_FEATURES));
    for (mut row, record) in x.rows_mut().into_iter().zip(records) {
        for (cell, value) in row.iter_mut().zip(record.features().to_vec()) {
            *cell = value;
        }
    }
    x
}

/// Observed outcomes, in record order.
#[must_use]
pub fn labels(records: &[PatientRecord]) -> Vec<bool> {
    records.iter().map(|r| r.actual_fall_6months).collect()
}

/// Held-out score of one candidate.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub name: &'static str,
    pub metrics: EvaluationMetrics,
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Every candidate, in evaluation order
    pub candidates: Vec<CandidateResult>,
    /// Index into `candidates` of the selected model
    pub selected: usize,
    pub metadata: ModelMetadata,
    /// Selected model's largest importances, largest first
    pub top_features: Vec<(String, f64)>,
}

impl TrainingReport {
    #[must_use]
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[self.selected]
    }
}

/// Service that trains and persists the fall-risk model.
pub struct TrainingService<C, A>
where
    C: CohortStore,
    A: ArtifactStore,
{
    cohort: Arc<C>,
    artifacts: Arc<A>,
    candidates: Vec<FittedModel>,
}

impl<C, A> TrainingService<C, A>
where
    C: CohortStore,
    A: ArtifactStore,
    C::Error: Into<crate::adapters::StorageError>,
    A::Error: Into<crate::adapters::StorageError>,
{
    /// Create a service with the default candidate set.
    pub fn new(cohort: Arc<C>, artifacts: Arc<A>, seed: u64) -> Self {
        Self::with_candidates(cohort, artifacts, FittedModel::candidates(seed))
    }

    /// Create a service with an explicit candidate list (in tie-break order).
    pub fn with_candidates(cohort: Arc<C>, artifacts: Arc<A>, candidates: Vec<FittedModel>) -> Self {
        Self {
            cohort,
            artifacts,
            candidates,
        }
    }

    /// Read both tables, train, and persist the winning model.
    ///
    /// Nothing is written unless every candidate trains and scores.
    ///
    /// # Errors
    /// Returns error if a table is missing or empty, a candidate cannot be
    /// fitted, the held-out AUC is undefined, or the artifacts cannot be
    /// written.
    pub fn train(&self) -> Result<TrainingReport, FallwatchError> {
        let train = self
            .cohort
            .load_split(Split::Train)
            .map_err(|e| FallwatchError::Storage(e.into()))?;
        let test = self
            .cohort
            .load_split(Split::Test)
            .map_err(|e| FallwatchError::Storage(e.into()))?;

        let (artifacts, report) = self.fit_and_select(&train, &test)?;

        self.artifacts
            .save(&artifacts)
            .map_err(|e| FallwatchError::Storage(e.into()))?;
        Ok(report)
    }

    /// Train every candidate in memory and build the winning bundle.
    ///
    /// # Errors
    /// See `train`.
    pub fn fit_and_select(
        &self,
        train: &[PatientRecord],
        test: &[PatientRecord],
    ) -> Result<(ModelArtifacts, TrainingReport), FallwatchError> {
        if train.is_empty() {
            return Err(FallwatchError::EmptyCohort(Split::Train.to_string()));
        }
        if test.is_empty() {
            return Err(FallwatchError::EmptyCohort(Split::Test.to_string()));
        }
        if self.candidates.is_empty() {
            return Err(FallwatchError::Validation(
                "no candidate models configured".to_string(),
            ));
        }

        let x_train = design_matrix(train);
        let y_train = labels(train);
        let x_test = design_matrix(test);
        let y_test = labels(test);

        tracing::info!(
            "Training on {} rows, evaluating on {} rows ({} features)",
            train.len(),
            test.len(),
            N_FEATURES
        );

        let scaler = StandardScaler::fit(&x_train)?;
        let xs_train = scaler.transform(&x_train)?;
        let xs_test = scaler.transform(&x_test)?;

        let mut fitted = Vec::with_capacity(self.candidates.len());
        let mut results = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            let mut model = candidate.clone();
            model.fit(&xs_train, &y_train)?;
            let proba = model.predict_proba(&xs_test)?;
            let metrics = EvaluationMetrics::evaluate(&y_test, &proba.to_vec())?;

            tracing::info!(
                "{}: auc={:.4} accuracy={:.4} sensitivity={:.4} specificity={:.4}",
                model.name(),
                metrics.auc,
                metrics.accuracy,
                metrics.sensitivity,
                metrics.specificity
            );
            results.push(CandidateResult {
                name: model.name(),
                metrics,
            });
            fitted.push(model);
        }

        // Strictly greater so the earliest candidate wins a tie.
        let mut selected = 0;
        for (i, result) in results.iter().enumerate().skip(1) {
            if result.metrics.auc > results[selected].metrics.auc {
                selected = i;
            }
        }

        let best = &results[selected];
        tracing::info!("Selected {} (auc={:.4})", best.name, best.metrics.auc);
        tracing::info!("Confusion matrix:\n{}", best.metrics.confusion.display());

        let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect();
        let metadata = ModelMetadata::new(
            best.name,
            &best.metrics,
            feature_names.clone(),
            train.len(),
            test.len(),
        );

        let model = fitted.swap_remove(selected);

        let mut ranked: Vec<(String, f64)> = feature_names
            .iter()
            .cloned()
            .zip(model.feature_importances()?)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(TOP_FEATURES);
        tracing::info!("Top {} features:", ranked.len());
        for (rank, (name, weight)) in ranked.iter().enumerate() {
            tracing::info!("  {:>2}. {:<26} {:.4}", rank + 1, name, weight);
        }
        let artifacts = ModelArtifacts {
            model,
            scaler,
            feature_names,
            metadata: metadata.clone(),
            fingerprint: None,
        };
        artifacts
            .check_consistency()
            .map_err(FallwatchError::SchemaMismatch)?;

        let report = TrainingReport {
            candidates: results,
            selected,
            metadata,
            top_features: ranked,
        };
        Ok((artifacts, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::files::{CsvCohortStore, FsArtifactStore};
    use crate::adapters::ml::{
        BoostingConfig, ForestConfig, GradientBoosting, LogisticConfig, LogisticRegression,
        RandomForest,
    };
    use crate::application::CohortGenerator;
    use crate::domain::MetricsError;
    use tempfile::tempdir;

    /// Candidates small enough for unit tests.
    fn quick_candidates() -> Vec<FittedModel> {
        vec![
            FittedModel::RandomForest(RandomForest::new(ForestConfig {
                n_trees: 15,
                max_depth: 6,
                ..ForestConfig::default()
            })),
            FittedModel::GradientBoosting(GradientBoosting::new(BoostingConfig {
                n_estimators: 20,
                max_depth: 3,
                ..BoostingConfig::default()
            })),
            FittedModel::LogisticRegression(LogisticRegression::new(LogisticConfig {
                max_iter: 500,
                ..LogisticConfig::default()
            })),
        ]
    }

    fn service(
        data: &std::path::Path,
        models: &std::path::Path,
    ) -> TrainingService<CsvCohortStore, FsArtifactStore> {
        TrainingService::with_candidates(
            Arc::new(CsvCohortStore::new(data)),
            Arc::new(FsArtifactStore::new(models)),
            quick_candidates(),
        )
    }

    #[test]
    fn test_design_matrix_schema() {
        let records = CohortGenerator::new(1).generate(5);
        let x = design_matrix(&records);
        assert_eq!(x.dim(), (5, N_FEATURES));
        assert!((x[[0, 0]] - f64::from(records[0].age)).abs() < 1e-12);
        let gender = x[[0, N_FEATURES - 1]];
        assert!(gender == 0.0 || gender == 1.0);
    }

    #[test]
    fn test_selects_highest_auc() {
        let dir = tempdir().expect("tempdir");
        let svc = service(dir.path(), dir.path());
        let (train, test) = CohortGenerator::new(42).generate_split(300, 100);

        let (artifacts, report) = svc.fit_and_select(&train, &test).expect("train");
        assert_eq!(report.candidates.len(), 3);
        let best_auc = report.best().metrics.auc;
        assert!(report.candidates.iter().all(|c| c.metrics.auc <= best_auc));
        // first index holding the max
        let first_max = report
            .candidates
            .iter()
            .position(|c| c.metrics.auc == best_auc)
            .expect("present");
        assert_eq!(report.selected, first_max);

        assert_eq!(artifacts.metadata.model_type, report.best().name);
        assert_eq!(artifacts.metadata.training_samples, 300);
        assert_eq!(artifacts.metadata.test_samples, 100);
        assert_eq!(artifacts.feature_names.len(), N_FEATURES);
        assert!(!artifacts.feature_names.iter().any(|n| n == "risk_score"));
        assert!(best_auc > 0.6, "auc was {best_auc}");
    }

    #[test]
    fn test_report_ranks_top_features() {
        let dir = tempdir().expect("tempdir");
        let svc = service(dir.path(), dir.path());
        let (train, test) = CohortGenerator::new(7).generate_split(250, 80);

        let (artifacts, report) = svc.fit_and_select(&train, &test).expect("train");
        assert_eq!(report.top_features.len(), TOP_FEATURES);
        for pair in report.top_features.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert!(report
            .top_features
            .iter()
            .all(|(name, _)| FEATURE_NAMES.contains(&name.as_str())));

        let all = artifacts.model.feature_importances().expect("importances");
        let max = all.iter().copied().fold(f64::MIN, f64::max);
        assert!((report.top_features[0].1 - max).abs() < 1e-12);
    }

    #[test]
    fn test_train_persists_artifacts() {
        let data = tempdir().expect("tempdir");
        let models = tempdir().expect("tempdir");
        let (train, test) = CohortGenerator::new(9).generate_split(200, 80);
        let cohort = CsvCohortStore::new(data.path());
        cohort.save_split(Split::Train, &train).expect("save");
        cohort.save_split(Split::Test, &test).expect("save");

        let report = service(data.path(), models.path()).train().expect("train");
        let loaded = FsArtifactStore::new(models.path()).load().expect("load");
        assert_eq!(loaded.metadata, report.metadata);

        // every generator row scales and predicts
        let x = loaded.scaler.transform(&design_matrix(&test)).expect("scale");
        let proba = loaded.model.predict_proba(&x).expect("predict");
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_single_class_holdout_aborts() {
        let data = tempdir().expect("tempdir");
        let models = tempdir().expect("tempdir");
        let (train, mut test) = CohortGenerator::new(42).generate_split(200, 50);
        for r in &mut test {
            r.actual_fall_6months = false;
        }
        let cohort = CsvCohortStore::new(data.path());
        cohort.save_split(Split::Train, &train).expect("save");
        cohort.save_split(Split::Test, &test).expect("save");

        let err = service(data.path(), models.path()).train().unwrap_err();
        assert!(matches!(
            err,
            FallwatchError::Metrics(MetricsError::UndefinedAuc { positives: 0, .. })
        ));
        assert!(std::fs::read_dir(models.path()).expect("dir").next().is_none());
    }

    #[test]
    fn test_empty_and_single_class_training() {
        let dir = tempdir().expect("tempdir");
        let svc = service(dir.path(), dir.path());
        let test = CohortGenerator::new(1).generate(20);

        assert!(matches!(
            svc.fit_and_select(&[], &test),
            Err(FallwatchError::EmptyCohort(_))
        ));

        let mut train = CohortGenerator::new(2).generate(50);
        for r in &mut train {
            r.actual_fall_6months = true;
        }
        assert!(matches!(
            svc.fit_and_select(&train, &test),
            Err(FallwatchError::Model(crate::ports::ModelError::SingleClass))
        ));
    }

    #[test]
    fn test_missing_tables() {
        let dir = tempdir().expect("tempdir");
        let err = service(dir.path(), dir.path()).train().unwrap_err();
        assert!(matches!(
            err,
            FallwatchError::Storage(crate::adapters::StorageError::NotFound(_))
        ));
    }
}

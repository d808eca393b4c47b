//! In-crate classifiers and the feature scaler.
//!
//! - `tree`: weighted CART regression tree shared by the ensembles
//! - `forest`: bootstrap random forest
//! - `boosting`: gradient boosted trees on log-loss
//! - `logistic`: L2 logistic regression
//! - `scaler`: standardization fit on the training set

mod boosting;
mod forest;
mod logistic;
mod scaler;
mod tree;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use forest::{ForestConfig, RandomForest};
pub use logistic::{LogisticConfig, LogisticRegression};
pub use scaler::StandardScaler;
pub use tree::{RegressionTree, TreeConfig};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::domain::ModelMetadata;
use crate::ports::{Classifier, ModelError};

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Per-sample weights `n / (2 · n_class)` so both classes carry equal mass.
pub(crate) fn balanced_weights(y: &[bool]) -> Vec<f64> {
    let n = y.len() as f64;
    let pos = y.iter().filter(|&&t| t).count() as f64;
    let neg = n - pos;
    let w_pos = if pos > 0.0 { n / (2.0 * pos) } else { 0.0 };
    let w_neg = if neg > 0.0 { n / (2.0 * neg) } else { 0.0 };
    y.iter().map(|&t| if t { w_pos } else { w_neg }).collect()
}

pub(crate) fn check_columns(expected: usize, x: &Array2<f64>) -> Result<(), ModelError> {
    if x.ncols() == expected {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            expected,
            got: x.ncols(),
        })
    }
}

/// A fitted classifier of any supported family, as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type", content = "model")]
pub enum FittedModel {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    LogisticRegression(LogisticRegression),
}

impl FittedModel {
    /// Unfitted candidates in selection order. Ties in AUC go to the
    /// earliest entry.
    #[must_use]
    pub fn candidates(seed: u64) -> Vec<Self> {
        vec![
            Self::RandomForest(RandomForest::new(ForestConfig {
                seed,
                ..ForestConfig::default()
            })),
            Self::GradientBoosting(GradientBoosting::new(BoostingConfig {
                seed,
                ..BoostingConfig::default()
            })),
            Self::LogisticRegression(LogisticRegression::new(LogisticConfig::default())),
        ]
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::LogisticRegression(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::LogisticRegression(m) => m,
        }
    }

    /// Number of input columns the fitted model expects (0 if unfitted).
    #[must_use]
    pub fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_features(),
            Self::GradientBoosting(m) => m.n_features(),
            Self::LogisticRegression(m) => m.coefficients.as_ref().map_or(0, Vec::len),
        }
    }
}

impl Classifier for FittedModel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        self.inner().predict_proba(x)
    }

    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        self.inner().feature_importances()
    }
}

/// Everything the inference layer needs, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: FittedModel,
    pub scaler: StandardScaler,
    /// Column order the model and scaler expect
    pub feature_names: Vec<String>,
    pub metadata: ModelMetadata,
    /// SHA-256 of the serialized model, when loaded from disk
    pub fingerprint: Option<String>,
}

impl ModelArtifacts {
    /// Check that the four artifacts agree with each other.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let n = self.feature_names.len();

        let mut seen = std::collections::HashSet::new();
        for name in &self.feature_names {
            if !seen.insert(name.as_str()) {
                return Err(format!("duplicate feature name '{name}'"));
            }
        }
        if self.scaler.n_features() != n {
            return Err(format!(
                "scaler expects {} features but feature list has {n}",
                self.scaler.n_features()
            ));
        }
        if self.model.n_features() != n {
            return Err(format!(
                "model expects {} features but feature list has {n}",
                self.model.n_features()
            ));
        }
        if self.metadata.n_features != n || self.metadata.feature_names != self.feature_names {
            return Err("metadata feature list differs from feature_names".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Three columns: strong signal, weak signal, noise.
    pub(crate) fn toy_problem(n: usize, seed: u64) -> (Array2<f64>, Vec<bool>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut x = Array2::zeros((n, 3));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(-1.0..1.0);
            let b: f64 = rng.gen_range(-1.0..1.0);
            let c: f64 = rng.gen_range(-1.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            x[[i, 2]] = c;
            y.push(a + 0.3 * b > 0.0);
        }
        // guarantee both classes on tiny samples
        y[0] = true;
        y[n - 1] = false;
        (x, y)
    }

    #[test]
    fn test_sigmoid_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn test_balanced_weights() {
        let w = balanced_weights(&[true, false, false, false]);
        assert!((w[0] - 2.0).abs() < 1e-12);
        assert!((w[1] - 2.0 / 3.0).abs() < 1e-12);
        let total_pos: f64 = w[..1].iter().sum();
        let total_neg: f64 = w[1..].iter().sum();
        assert!((total_pos - total_neg).abs() < 1e-12);
    }

    #[test]
    fn test_fitted_model_json_roundtrip() {
        let (x, y) = toy_problem(80, 5);
        let mut model = FittedModel::LogisticRegression(LogisticRegression::new(
            LogisticConfig::default(),
        ));
        model.fit(&x, &y).expect("fit");

        let json = serde_json::to_string(&model).expect("serialize");
        assert!(json.contains("\"model_type\":\"LogisticRegression\""));
        let back: FittedModel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(
            model.predict_proba(&x).expect("proba"),
            back.predict_proba(&x).expect("proba")
        );
        assert_eq!(back.n_features(), 3);
    }

    #[test]
    fn test_candidate_order() {
        let names: Vec<_> = FittedModel::candidates(42).iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec!["Random Forest", "Gradient Boosting", "Logistic Regression"]
        );
    }
}

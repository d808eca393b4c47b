//! Classifier port: Trait for binary fall/no-fall classifiers.
//!
//! This trait abstracts the concrete learners (random forest, gradient
//! boosting, logistic regression) from the training and inference services.

use ndarray::{Array1, Array2};

/// Errors that can occur while fitting or querying a classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Label count {labels} does not match sample count {samples}")]
    LabelMismatch { samples: usize, labels: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training set contains a single class")]
    SingleClass,

    #[error("Non-finite value in input")]
    NonFinite,
}

/// Trait for binary probabilistic classifiers over a dense design matrix.
///
/// Rows are samples, columns follow the persisted feature schema. Inputs are
/// expected to be standardized already.
pub trait Classifier: Send + Sync {
    /// Short human-readable model family name.
    fn name(&self) -> &'static str;

    /// Fit on a design matrix and boolean labels (true = fell).
    ///
    /// # Errors
    /// Returns error if the data is empty, single-class or mis-shaped.
    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError>;

    /// Probability of the positive class for each row.
    ///
    /// # Errors
    /// Returns error if the model is unfitted or the column count differs.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Class labels at a 0.5 threshold.
    ///
    /// # Errors
    /// Same as `predict_proba`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<bool>, ModelError> {
        Ok(self.predict_proba(x)?.iter().map(|&p| p >= 0.5).collect())
    }

    /// Non-negative per-feature importance, normalized to sum to 1 when
    /// any feature carries weight.
    ///
    /// # Errors
    /// Returns error if the model is unfitted.
    fn feature_importances(&self) -> Result<Vec<f64>, ModelError>;
}

/// Shared input checks for `fit` implementations.
///
/// # Errors
/// Returns error on empty input, label/sample mismatch, non-finite values or
/// a single class.
pub fn check_training_data(x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::LabelMismatch {
            samples: x.nrows(),
            labels: y.len(),
        });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite);
    }
    let positives = y.iter().filter(|&&t| t).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

/// Scale importances to sum to 1, leaving an all-zero vector untouched.
#[must_use]
pub fn normalize_importances(mut values: Vec<f64>) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in &mut values {
            *v /= sum;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_check_training_data() {
        let x = array![[0.0, 1.0], [1.0, 0.0]];
        assert!(check_training_data(&x, &[true, false]).is_ok());
        assert_eq!(
            check_training_data(&x, &[true, true]),
            Err(ModelError::SingleClass)
        );
        assert_eq!(
            check_training_data(&x, &[true]),
            Err(ModelError::LabelMismatch {
                samples: 2,
                labels: 1
            })
        );
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(
            check_training_data(&empty, &[]),
            Err(ModelError::EmptyTrainingSet)
        );
    }

    #[test]
    fn test_normalize_importances() {
        let v = normalize_importances(vec![1.0, 3.0]);
        assert!((v[0] - 0.25).abs() < 1e-12);
        assert_eq!(normalize_importances(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}

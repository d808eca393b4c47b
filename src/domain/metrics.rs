//! Binary classification metrics for held-out evaluation.

use serde::{Deserialize, Serialize};

/// Errors raised while scoring a classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("AUC is undefined: held-out set has {positives} positive and {negatives} negative samples")]
    UndefinedAuc { positives: usize, negatives: usize },

    #[error("Length mismatch: {labels} labels vs {scores} scores")]
    LengthMismatch { labels: usize, scores: usize },
}

/// Confusion matrix for binary classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    #[must_use]
    pub fn from_labels(y_true: &[bool], y_pred: &[bool]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// (TP + TN) / total; 0 on an empty matrix.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// True-positive rate; 0 when there are no positives.
    #[must_use]
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// True-negative rate; 0 when there are no negatives.
    #[must_use]
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "Predicted:    0       1\n\
             Actual 0:   {:>5}   {:>5}  (TN/FP)\n\
             Actual 1:   {:>5}   {:>5}  (FN/TP)",
            self.tn, self.fp, self.fn_, self.tp
        )
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Tied scores receive their average rank.
///
/// # Errors
/// `UndefinedAuc` if either class is absent, `LengthMismatch` if the inputs
/// differ in length.
pub fn roc_auc(y_true: &[bool], scores: &[f64]) -> Result<f64, MetricsError> {
    if y_true.len() != scores.len() {
        return Err(MetricsError::LengthMismatch {
            labels: y_true.len(),
            scores: scores.len(),
        });
    }

    let positives = y_true.iter().filter(|&&t| t).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MetricsError::UndefinedAuc {
            positives,
            negatives,
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // 1-based ranks, ties averaged
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let rank_sum: f64 = ranks
        .iter()
        .zip(y_true)
        .filter(|(_, t)| **t)
        .map(|(r, _)| r)
        .sum();

    let n_pos = positives as f64;
    let n_neg = negatives as f64;
    let u = rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Ok(u / (n_pos * n_neg))
}

/// Held-out evaluation of one fitted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub auc: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub confusion: ConfusionMatrix,
}

impl EvaluationMetrics {
    /// Score predicted probabilities against true labels. Labels are
    /// thresholded at 0.5.
    ///
    /// # Errors
    /// Propagates `roc_auc` errors.
    pub fn evaluate(y_true: &[bool], probabilities: &[f64]) -> Result<Self, MetricsError> {
        let auc = roc_auc(y_true, probabilities)?;
        let y_pred: Vec<bool> = probabilities.iter().map(|&p| p >= 0.5).collect();
        let confusion = ConfusionMatrix::from_labels(y_true, &y_pred);
        Ok(Self {
            accuracy: confusion.accuracy(),
            auc,
            sensitivity: confusion.sensitivity(),
            specificity: confusion.specificity(),
            confusion,
        })
    }
}

/// Persisted summary of the selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub accuracy: f64,
    pub auc: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub n_features: usize,
    pub training_samples: usize,
    pub test_samples: usize,
    pub feature_names: Vec<String>,
}

impl ModelMetadata {
    #[must_use]
    pub fn new(
        model_type: impl Into<String>,
        metrics: &EvaluationMetrics,
        feature_names: Vec<String>,
        training_samples: usize,
        test_samples: usize,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            accuracy: metrics.accuracy,
            auc: metrics.auc,
            sensitivity: metrics.sensitivity,
            specificity: metrics.specificity,
            n_features: feature_names.len(),
            training_samples,
            test_samples,
            feature_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_rates() {
        let y_true = [true, true, true, false, false, false, false];
        let y_pred = [true, true, false, false, false, false, true];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred);
        assert_eq!(cm, ConfusionMatrix { tp: 2, tn: 3, fp: 1, fn_: 1 });
        assert!((cm.accuracy() - 5.0 / 7.0).abs() < 1e-12);
        assert!((cm.sensitivity() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.specificity() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominators() {
        let cm = ConfusionMatrix { tp: 0, tn: 4, fp: 0, fn_: 0 };
        assert_eq!(cm.sensitivity(), 0.0);
        assert_eq!(ConfusionMatrix::default().accuracy(), 0.0);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let y = [false, false, true, true];
        let auc = roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]).expect("defined");
        assert!((auc - 1.0).abs() < 1e-12);
        let auc = roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]).expect("defined");
        assert!(auc.abs() < 1e-12);
    }

    #[test]
    fn test_auc_with_ties() {
        let y = [false, true, false, true];
        let auc = roc_auc(&y, &[0.5, 0.5, 0.5, 0.5]).expect("defined");
        assert!((auc - 0.5).abs() < 1e-12);

        // one positive above both negatives, one tied with a negative
        let auc = roc_auc(&[false, false, true, true], &[0.1, 0.4, 0.4, 0.9]).expect("defined");
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_is_error() {
        let err = roc_auc(&[true, true, true], &[0.2, 0.4, 0.9]).unwrap_err();
        assert_eq!(
            err,
            MetricsError::UndefinedAuc {
                positives: 3,
                negatives: 0
            }
        );
    }

    #[test]
    fn test_evaluate() {
        let y = [false, false, true, true];
        let metrics = EvaluationMetrics::evaluate(&y, &[0.1, 0.6, 0.4, 0.9]).expect("defined");
        assert!((metrics.accuracy - 0.5).abs() < 1e-12);
        assert!((metrics.auc - 0.75).abs() < 1e-12);
        assert!((metrics.sensitivity - 0.5).abs() < 1e-12);
        assert!((metrics.specificity - 0.5).abs() < 1e-12);
    }
}

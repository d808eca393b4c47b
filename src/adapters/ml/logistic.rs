//! L2-regularized logistic regression fit by batch gradient descent.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{balanced_weights, check_columns, sigmoid};
use crate::ports::{check_training_data, normalize_importances, Classifier, ModelError};

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength (smaller = stronger penalty)
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the cost changes by less than this between iterations
    pub tolerance: f64,
    pub balanced: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 0.1,
            learning_rate: 0.5,
            max_iter: 2000,
            tolerance: 1e-8,
            balanced: true,
        }
    }
}

/// Logistic regression classifier.
///
/// Minimises `Σ wᵢ·logloss(xᵢ) / n + ‖β‖² / (2·C·n)`; the intercept is not
/// penalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    pub coefficients: Option<Vec<f64>>,
    pub intercept: Option<f64>,
    /// Iterations used by the last fit
    pub n_iter: usize,
}

impl LogisticRegression {
    #[must_use]
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            coefficients: None,
            intercept: None,
            n_iter: 0,
        }
    }

    fn weighted_cost(
        y: &Array1<f64>,
        p: &Array1<f64>,
        w: &Array1<f64>,
        beta: &Array1<f64>,
        penalty: f64,
    ) -> f64 {
        let eps = 1e-15;
        let n = y.len() as f64;
        let loss: f64 = y
            .iter()
            .zip(p)
            .zip(w)
            .map(|((&yi, &pi), &wi)| {
                let pc = pi.clamp(eps, 1.0 - eps);
                -wi * (yi * pc.ln() + (1.0 - yi) * (1.0 - pc).ln())
            })
            .sum();
        loss / n + penalty * beta.dot(beta) / 2.0
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "Logistic Regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n = x.nrows() as f64;
        let target: Array1<f64> = y.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect();
        let weight = Array1::from(if self.config.balanced {
            balanced_weights(y)
        } else {
            vec![1.0; y.len()]
        });
        let penalty = 1.0 / (self.config.c * n);
        let lr = self.config.learning_rate;

        let mut beta = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        let mut prev_cost = f64::INFINITY;
        self.n_iter = 0;

        for iter in 0..self.config.max_iter {
            let p = (x.dot(&beta) + bias).mapv(sigmoid);
            let cost = Self::weighted_cost(&target, &p, &weight, &beta, penalty);
            if (prev_cost - cost).abs() < self.config.tolerance {
                tracing::debug!(iter, cost, "Logistic regression converged");
                break;
            }
            prev_cost = cost;

            let err = (&p - &target) * &weight;
            let grad = x.t().dot(&err) / n + &beta * penalty;
            let grad_b = err.sum() / n;

            beta = beta - grad * lr;
            bias -= lr * grad_b;
            self.n_iter = iter + 1;
        }

        self.coefficients = Some(beta.to_vec());
        self.intercept = Some(bias);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coef = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        let bias = self.intercept.ok_or(ModelError::NotFitted)?;
        check_columns(coef.len(), x)?;

        let beta = Array1::from(coef.clone());
        Ok((x.dot(&beta) + bias).mapv(sigmoid))
    }

    /// |coefficient| per feature, normalized.
    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        let coef = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        Ok(normalize_importances(coef.iter().map(|c| c.abs()).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ml::tests::toy_problem;
    use crate::domain::roc_auc;

    #[test]
    fn test_logistic_learns_sign() {
        let (x, y) = toy_problem(200, 9);
        let mut model = LogisticRegression::new(LogisticConfig::default());
        model.fit(&x, &y).expect("fit");

        let coef = model.coefficients.as_ref().expect("fitted");
        assert!(coef[0] > 0.0);
        assert!(coef[0].abs() > coef[2].abs());

        let proba = model.predict_proba(&x).expect("proba");
        let auc = roc_auc(&y, proba.as_slice().expect("contiguous")).expect("auc");
        assert!(auc > 0.9, "auc was {auc}");
    }

    #[test]
    fn test_stronger_penalty_shrinks_coefficients() {
        let (x, y) = toy_problem(150, 4);
        let mut loose = LogisticRegression::new(LogisticConfig {
            c: 10.0,
            ..LogisticConfig::default()
        });
        let mut tight = LogisticRegression::new(LogisticConfig {
            c: 0.01,
            ..LogisticConfig::default()
        });
        loose.fit(&x, &y).expect("fit");
        tight.fit(&x, &y).expect("fit");

        let norm = |m: &LogisticRegression| -> f64 {
            m.coefficients
                .as_ref()
                .expect("fitted")
                .iter()
                .map(|c| c * c)
                .sum()
        };
        assert!(norm(&tight) < norm(&loose));
    }

    #[test]
    fn test_importances_from_coefficients() {
        let mut model = LogisticRegression::new(LogisticConfig::default());
        model.coefficients = Some(vec![-3.0, 1.0]);
        model.intercept = Some(0.0);
        let imp = model.feature_importances().expect("fitted");
        assert!((imp[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = toy_problem(20, 1);
        let mut model = LogisticRegression::new(LogisticConfig::default());
        let y = vec![false; 20];
        assert_eq!(model.fit(&x, &y).unwrap_err(), ModelError::SingleClass);
    }
}

//! Gradient boosted trees for binary log-loss.

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeConfig};
use super::{check_columns, sigmoid};
use crate::ports::{check_training_data, normalize_importances, Classifier, ModelError};

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 5,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Additive model in log-odds space: `F(x) = F0 + lr * Σ tree_k(x)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    config: BoostingConfig,
    init: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoosting {
    #[must_use]
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            init: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn raw_score(&self, row: ndarray::ArrayView1<'_, f64>) -> f64 {
        self.init
            + self.config.learning_rate
                * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &'static str {
        "Gradient Boosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n = x.nrows();
        let target: Vec<f64> = y.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect();
        let prior = (target.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.init = (prior / (1.0 - prior)).ln();

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: None,
        };
        let unit = vec![1.0; n];
        let indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut raw = vec![self.init; n];
        self.trees.clear();

        for _ in 0..self.config.n_estimators {
            let prob: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let residual: Vec<f64> = target.iter().zip(&prob).map(|(t, p)| t - p).collect();

            // Newton step per leaf: Σ r / Σ p(1 - p)
            let leaf = |rows: &[usize]| {
                let (mut num, mut den) = (0.0, 0.0);
                for &i in rows {
                    num += residual[i];
                    den += prob[i] * (1.0 - prob[i]);
                }
                if den < 1e-12 {
                    0.0
                } else {
                    num / den
                }
            };

            let mut tree = RegressionTree::new(tree_config.clone());
            tree.fit(x, &residual, &unit, &indices, &mut rng, &leaf);

            for (i, row) in x.rows().into_iter().enumerate() {
                raw[i] += self.config.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }
        self.n_features = x.ncols();

        tracing::debug!(stages = self.trees.len(), init = self.init, "Gradient boosting fitted");
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_columns(self.n_features, x)?;
        Ok(x.rows().into_iter().map(|row| sigmoid(self.raw_score(row))).collect())
    }

    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.importances()) {
                *acc += v;
            }
        }
        Ok(normalize_importances(total))
    }
}

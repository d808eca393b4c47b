//! Random forest classifier with bootstrap sampling and balanced class
//! weights.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeConfig};
use super::{balanced_weights, check_columns};
use crate::ports::{check_training_data, normalize_importances, Classifier, ModelError};

/// Random forest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (√p, rounded up, if None)
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    /// Reweight classes inversely to their frequency
    pub balanced: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 10,
            min_samples_split: 10,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            balanced: true,
            seed: 42,
        }
    }
}

/// Random forest over weighted regression trees fit to 0/1 labels.
///
/// Each leaf stores the weighted positive fraction of its samples; the forest
/// averages leaf values across trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    #[must_use]
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "Random Forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n = x.nrows();
        let p = x.ncols();
        let target: Vec<f64> = y.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect();
        let weight = if self.config.balanced {
            balanced_weights(y)
        } else {
            vec![1.0; n]
        };
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (p as f64).sqrt().ceil() as usize);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };
        let leaf = |rows: &[usize]| RegressionTree::weighted_mean(&target, &weight, rows);

        self.trees = (0..self.config.n_trees)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(t as u64));
                let indices: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut tree = RegressionTree::new(tree_config.clone());
                tree.fit(x, &target, &weight, &indices, &mut rng, &leaf);
                tree
            })
            .collect();
        self.n_features = p;

        tracing::debug!(
            trees = self.trees.len(),
            max_features,
            "Random forest fitted"
        );
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_columns(self.n_features, x)?;

        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }

    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            // each tree contributes equally, as normalized importances
            let per_tree = normalize_importances(tree.importances().to_vec());
            for (acc, v) in total.iter_mut().zip(per_tree) {
                *acc += v;
            }
        }
        Ok(normalize_importances(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ml::tests::toy_problem;

    #[test]
    fn test_forest_learns_toy_problem() {
        let (x, y) = toy_problem(200, 3);
        let mut forest = RandomForest::new(ForestConfig {
            n_trees: 25,
            ..ForestConfig::default()
        });
        forest.fit(&x, &y).expect("fit");
        assert_eq!(forest.n_trees(), 25);

        let labels = forest.predict(&x).expect("predict");
        let correct = labels.iter().zip(&y).filter(|(a, b)| a == b).count();
        assert!(correct as f64 / y.len() as f64 > 0.85);

        let proba = forest.predict_proba(&x).expect("proba");
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = toy_problem(120, 11);
        let config = ForestConfig {
            n_trees: 10,
            ..ForestConfig::default()
        };
        let mut a = RandomForest::new(config.clone());
        let mut b = RandomForest::new(config);
        a.fit(&x, &y).expect("fit");
        b.fit(&x, &y).expect("fit");
        assert_eq!(
            a.predict_proba(&x).expect("proba"),
            b.predict_proba(&x).expect("proba")
        );
    }

    #[test]
    fn test_importance_favours_signal_column() {
        let (x, y) = toy_problem(200, 5);
        let mut forest = RandomForest::new(ForestConfig {
            n_trees: 20,
            max_features: Some(3),
            ..ForestConfig::default()
        });
        forest.fit(&x, &y).expect("fit");
        let imp = forest.feature_importances().expect("importances");
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[2]);
    }

    #[test]
    fn test_unfitted_errors() {
        let forest = RandomForest::new(ForestConfig::default());
        assert_eq!(
            forest.predict_proba(&Array2::zeros((1, 3))).unwrap_err(),
            ModelError::NotFitted
        );
    }
}

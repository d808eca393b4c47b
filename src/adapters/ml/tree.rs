//! Weighted CART regression tree.
//!
//! Splits minimise weighted squared error. On 0/1 targets this is the same
//! ordering as weighted Gini impurity, so the random forest grows these trees
//! directly on labels. Gradient boosting grows them on pseudo-residuals and
//! supplies its own leaf values.

use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Minimum impurity decrease for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

/// Tree growth limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
    /// Features sampled per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Training inputs shared across the recursive build.
struct Samples<'a> {
    x: &'a Array2<f64>,
    target: &'a [f64],
    weight: &'a [f64],
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Fitted regression tree stored as a flat node arena (root at index 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RegressionTree {
    #[must_use]
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            n_features: 0,
            importances: Vec::new(),
        }
    }

    /// Grow the tree on the rows listed in `indices` (duplicates allowed for
    /// bootstrap samples). `leaf_value` maps the rows reaching a leaf to its
    /// prediction.
    pub fn fit<F>(
        &mut self,
        x: &Array2<f64>,
        target: &[f64],
        weight: &[f64],
        indices: &[usize],
        rng: &mut ChaCha8Rng,
        leaf_value: &F,
    ) where
        F: Fn(&[usize]) -> f64,
    {
        self.n_features = x.ncols();
        self.nodes.clear();
        self.importances = vec![0.0; self.n_features];

        let samples = Samples { x, target, weight };
        let mut rows = indices.to_vec();
        self.grow(&samples, &mut rows, 0, rng, leaf_value);
    }

    /// Weighted mean of the targets, the default leaf value.
    #[must_use]
    pub fn weighted_mean(target: &[f64], weight: &[f64], rows: &[usize]) -> f64 {
        let (mut sw, mut swy) = (0.0, 0.0);
        for &i in rows {
            sw += weight[i];
            swy += weight[i] * target[i];
        }
        if sw > 0.0 {
            swy / sw
        } else {
            0.0
        }
    }

    fn grow<F>(
        &mut self,
        s: &Samples<'_>,
        rows: &mut [usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        leaf_value: &F,
    ) -> usize
    where
        F: Fn(&[usize]) -> f64,
    {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: leaf_value(rows),
        });

        if depth >= self.config.max_depth || rows.len() < self.config.min_samples_split {
            return id;
        }

        let Some(best) = self.best_split(s, rows, rng) else {
            return id;
        };

        // Partition rows in place: left block first.
        let mut boundary = 0;
        for i in 0..rows.len() {
            if s.x[[rows[i], best.feature]] <= best.threshold {
                rows.swap(i, boundary);
                boundary += 1;
            }
        }
        self.importances[best.feature] += best.gain;

        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(s, left_rows, depth + 1, rng, leaf_value);
        let right = self.grow(s, right_rows, depth + 1, rng, leaf_value);

        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(
        &self,
        s: &Samples<'_>,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        if rows.len() < 2 {
            return None;
        }
        let (mut w_total, mut sum_total) = (0.0, 0.0);
        for &i in rows {
            w_total += s.weight[i];
            sum_total += s.weight[i] * s.target[i];
        }
        if w_total <= 0.0 {
            return None;
        }
        let parent_term = sum_total * sum_total / w_total;

        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        features.truncate(self.config.max_features.unwrap_or(self.n_features).max(1));

        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<BestSplit> = None;
        let mut order = rows.to_vec();

        for &feature in &features {
            order.sort_by(|&a, &b| s.x[[a, feature]].total_cmp(&s.x[[b, feature]]));

            let (mut w_left, mut sum_left) = (0.0, 0.0);
            for k in 0..order.len() - 1 {
                let i = order[k];
                w_left += s.weight[i];
                sum_left += s.weight[i] * s.target[i];

                let here = s.x[[i, feature]];
                let next = s.x[[order[k + 1], feature]];
                if here == next {
                    continue;
                }
                let n_left = k + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }

                let w_right = w_total - w_left;
                if w_left <= 0.0 || w_right <= 0.0 {
                    continue;
                }
                let sum_right = sum_total - sum_left;
                let gain = sum_left * sum_left / w_left + sum_right * sum_right / w_right
                    - parent_term;

                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Prediction for one row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Unnormalized weighted impurity decrease per feature.
    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

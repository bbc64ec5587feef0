//! CART decision tree used as the forest's base learner.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{Criterion, Hyperparams};
use crate::{Error, Result};

/// A fitted tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    /// Terminal node predicting a single class.
    Leaf {
        /// Majority class of the training rows that reached this leaf.
        class: usize,
    },
    /// Binary split on one feature.
    Split {
        /// Feature column index.
        feature: usize,
        /// Rows with `value <= threshold` go left.
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single CART classifier.
///
/// Trees are only fitted through [`super::RandomForest`], which supplies the
/// bootstrap sample and the per-split feature pool size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

/// Candidate split found during search.
struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl DecisionTree {
    /// Fit a tree on the rows at `indices`.
    ///
    /// `n_split_features` is the number of randomly drawn candidate features
    /// considered at each split.
    pub(crate) fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        indices: &[usize],
        n_classes: usize,
        n_split_features: usize,
        params: &Hyperparams,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::Dataset("cannot fit a tree on zero rows".into()));
        }
        let root = build_node(x, y, indices, n_classes, n_split_features, params, rng, 0);
        Ok(Self { root })
    }

    /// Predict the class of a single feature row.
    pub(crate) fn predict_row(&self, row: &[f64]) -> usize {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Class histogram of the rows at `indices`.
fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

/// Majority class; ties resolve to the smallest class index.
fn majority_class(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
        .map_or(0, |(class, _)| class)
}

fn impurity(counts: &[usize], total: usize, criterion: Criterion) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let total_f = total as f64;
    match criterion {
        Criterion::Gini => {
            let sum_sq: f64 = counts
                .iter()
                .map(|&c| {
                    #[allow(clippy::cast_precision_loss)]
                    let p = c as f64 / total_f;
                    p * p
                })
                .sum();
            1.0 - sum_sq
        }
        Criterion::Entropy => counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                #[allow(clippy::cast_precision_loss)]
                let p = c as f64 / total_f;
                -p * p.log2()
            })
            .sum(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    n_split_features: usize,
    params: &Hyperparams,
    rng: &mut StdRng,
    depth: usize,
) -> Node {
    let counts = class_counts(y, indices, n_classes);
    let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
    if is_pure || depth_reached || indices.len() < params.min_samples_split {
        return Node::Leaf {
            class: majority_class(&counts),
        };
    }

    match find_best_split(x, y, indices, n_classes, n_split_features, params, rng) {
        Some(split) => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[i][split.feature] <= split.threshold);
            let left = build_node(
                x,
                y,
                &left_idx,
                n_classes,
                n_split_features,
                params,
                rng,
                depth + 1,
            );
            let right = build_node(
                x,
                y,
                &right_idx,
                n_classes,
                n_split_features,
                params,
                rng,
                depth + 1,
            );
            Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        None => Node::Leaf {
            class: majority_class(&counts),
        },
    }
}

/// Search a random feature pool for the lowest weighted child impurity.
///
/// Returns `None` when no split satisfies `min_samples_leaf` on both sides,
/// which turns the node into a leaf.
fn find_best_split(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    n_split_features: usize,
    params: &Hyperparams,
    rng: &mut StdRng,
) -> Option<BestSplit> {
    let n_features = x[indices[0]].len();
    let mut pool: Vec<usize> = (0..n_features).collect();
    pool.shuffle(rng);
    pool.truncate(n_split_features.clamp(1, n_features));

    #[allow(clippy::cast_precision_loss)]
    let total_f = indices.len() as f64;
    let mut best: Option<BestSplit> = None;

    for &feature in &pool {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        // Incremental left/right histograms over the sorted rows.
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = class_counts(y, &sorted, n_classes);

        for pos in 0..sorted.len() - 1 {
            let i = sorted[pos];
            left_counts[y[i]] += 1;
            right_counts[y[i]] -= 1;

            let value = x[i][feature];
            let next_value = x[sorted[pos + 1]][feature];
            if value == next_value {
                continue;
            }
            let n_left = pos + 1;
            let n_right = sorted.len() - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let score = (n_left as f64 / total_f)
                * impurity(&left_counts, n_left, params.criterion)
                + (n_right as f64 / total_f)
                    * impurity(&right_counts, n_right, params.criterion);
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(BestSplit {
                    feature,
                    threshold: (value + next_value) / 2.0,
                    score,
                });
            }
        }
    }
    best
}

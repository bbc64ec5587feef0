//! Random-forest classifier
//!
//! A hand-rolled CART ensemble: bootstrap-sampled decision trees with
//! per-split feature subsampling and majority-vote prediction. The fitted
//! forest serializes to JSON and is the artifact format stored per run.
//!
//! ## Usage
//!
//! ```rust
//! use irisflow::dataset::Dataset;
//! use irisflow::model::{Hyperparams, RandomForest};
//!
//! # fn main() -> irisflow::Result<()> {
//! let dataset = Dataset::iris()?;
//! let forest = RandomForest::fit(
//!     dataset.features(),
//!     dataset.labels(),
//!     &Hyperparams::default(),
//! )?;
//! let predictions = forest.predict(dataset.features())?;
//! assert_eq!(predictions.len(), dataset.len());
//! # Ok(())
//! # }
//! ```

mod forest;
mod tree;

pub use forest::RandomForest;
pub(crate) use tree::DecisionTree;

use serde::{Deserialize, Serialize};

/// Split-quality criterion for tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity.
    Gini,
    /// Information entropy.
    Entropy,
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gini => write!(f, "gini"),
            Self::Entropy => write!(f, "entropy"),
        }
    }
}

/// One immutable hyperparameter configuration for a training attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Maximum tree depth; `None` grows until the stopping rules fire.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split an internal node.
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf.
    pub min_samples_leaf: usize,
    /// Split-quality criterion.
    pub criterion: Criterion,
    /// RNG seed for bootstrap and feature subsampling.
    pub seed: u64,
}

impl Default for Hyperparams {
    /// The fixed configuration used by single-run training.
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: Some(5),
            min_samples_split: 10,
            min_samples_leaf: 5,
            criterion: Criterion::Gini,
            seed: 42,
        }
    }
}

/// Fraction of correct predictions; 0.0 for empty inputs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    if predicted.is_empty() || predicted.len() != expected.len() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(expected)
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 / predicted.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_basic() {
        assert!((accuracy(&[0, 1, 2], &[0, 1, 1]) - 2.0 / 3.0).abs() < 1e-12);
        assert!((accuracy(&[1, 1], &[1, 1]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_degenerate() {
        assert!(accuracy(&[], &[]).abs() < f64::EPSILON);
        assert!(accuracy(&[0], &[0, 1]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_criterion_serde_lowercase() {
        let json = serde_json::to_string(&Criterion::Entropy).unwrap();
        assert_eq!(json, "\"entropy\"");
        let back: Criterion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Criterion::Entropy);
    }

    #[test]
    fn test_hyperparams_roundtrip() {
        let params = Hyperparams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: Hyperparams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}

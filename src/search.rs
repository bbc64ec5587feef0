//! Hyperparameter search space
//!
//! A typed grid of candidate values per dimension. Sampling draws uniformly
//! and independently per dimension, with replacement across trials, so
//! duplicate configurations are permitted and never deduplicated.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::model::{Criterion, Hyperparams};
use crate::{Error, Result};

/// Candidate values per hyperparameter dimension.
///
/// `Default` is the grid used by the original sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    n_estimators: Vec<usize>,
    max_depth: Vec<Option<usize>>,
    min_samples_split: Vec<usize>,
    min_samples_leaf: Vec<usize>,
    criterion: Vec<Criterion>,
    /// Seed pinned into every sampled configuration, so each fitted model is
    /// reproducible from its recorded hyperparameters alone.
    model_seed: u64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![10, 50, 100],
            max_depth: vec![None, Some(5), Some(10)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 3, 5],
            criterion: vec![Criterion::Gini, Criterion::Entropy],
            model_seed: 42,
        }
    }
}

impl SearchSpace {
    /// Replace the `n_estimators` candidates.
    #[must_use]
    pub fn n_estimators(mut self, values: Vec<usize>) -> Self {
        self.n_estimators = values;
        self
    }

    /// Replace the `max_depth` candidates (`None` = unbounded).
    #[must_use]
    pub fn max_depth(mut self, values: Vec<Option<usize>>) -> Self {
        self.max_depth = values;
        self
    }

    /// Replace the `min_samples_split` candidates.
    #[must_use]
    pub fn min_samples_split(mut self, values: Vec<usize>) -> Self {
        self.min_samples_split = values;
        self
    }

    /// Replace the `min_samples_leaf` candidates.
    #[must_use]
    pub fn min_samples_leaf(mut self, values: Vec<usize>) -> Self {
        self.min_samples_leaf = values;
        self
    }

    /// Replace the criterion candidates.
    #[must_use]
    pub fn criterion(mut self, values: Vec<Criterion>) -> Self {
        self.criterion = values;
        self
    }

    /// Set the seed pinned into every sampled configuration.
    #[must_use]
    pub const fn model_seed(mut self, seed: u64) -> Self {
        self.model_seed = seed;
        self
    }

    /// Draw one configuration, uniformly per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any dimension has no candidates.
    pub fn sample(&self, rng: &mut StdRng) -> Result<Hyperparams> {
        fn pick<'a, T>(values: &'a [T], name: &str, rng: &mut StdRng) -> Result<&'a T> {
            values
                .choose(rng)
                .ok_or_else(|| Error::InvalidInput(format!("search dimension '{name}' is empty")))
        }

        Ok(Hyperparams {
            n_estimators: *pick(&self.n_estimators, "n_estimators", rng)?,
            max_depth: *pick(&self.max_depth, "max_depth", rng)?,
            min_samples_split: *pick(&self.min_samples_split, "min_samples_split", rng)?,
            min_samples_leaf: *pick(&self.min_samples_leaf, "min_samples_leaf", rng)?,
            criterion: *pick(&self.criterion, "criterion", rng)?,
            seed: self.model_seed,
        })
    }
}

//! Bootstrap-aggregated ensemble over [`DecisionTree`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{DecisionTree, Hyperparams};
use crate::{Error, Result};

/// A fitted random-forest classifier.
///
/// Immutable once fitted; this is the artifact serialized into the run store
/// and loaded by the predictor service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    params: Hyperparams,
}

impl RandomForest {
    /// Fit an ensemble on row-major features `x` and labels `y`.
    ///
    /// Each tree sees a bootstrap sample of the rows and considers
    /// `ceil(sqrt(n_features))` random features per split. The whole fit is
    /// deterministic in `params.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unusable configuration
    /// (`n_estimators == 0`, `min_samples_split < 2`, `min_samples_leaf == 0`)
    /// and [`Error::Dataset`] for unusable data (empty, mismatched lengths,
    /// fewer than two classes).
    pub fn fit(x: &[Vec<f64>], y: &[usize], params: &Hyperparams) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(Error::InvalidInput("n_estimators must be >= 1".into()));
        }
        if params.min_samples_split < 2 {
            return Err(Error::InvalidInput("min_samples_split must be >= 2".into()));
        }
        if params.min_samples_leaf == 0 {
            return Err(Error::InvalidInput("min_samples_leaf must be >= 1".into()));
        }
        if x.is_empty() {
            return Err(Error::Dataset("cannot fit on an empty dataset".into()));
        }
        if x.len() != y.len() {
            return Err(Error::Dataset(format!(
                "feature rows ({}) and labels ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        let n_classes = y.iter().max().map_or(0, |max| max + 1);
        if n_classes < 2 {
            return Err(Error::Dataset("need at least 2 classes".into()));
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let n_split_features = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let bootstrap: Vec<usize> =
                (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            trees.push(DecisionTree::fit(
                x,
                y,
                &bootstrap,
                n_classes,
                n_split_features,
                params,
                &mut rng,
            )?);
        }

        Ok(Self {
            trees,
            n_features,
            n_classes,
            params: params.clone(),
        })
    }

    /// Number of feature columns the forest was fitted on.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes the forest predicts over.
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Hyperparameters this forest was fitted with.
    #[must_use]
    pub const fn params(&self) -> &Hyperparams {
        &self.params
    }

    /// Majority-vote prediction for each feature row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] if any row has the wrong number of
    /// features or contains a non-finite value. The forest itself is left
    /// untouched by a failed call.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != self.n_features {
                return Err(Error::Inference(format!(
                    "row {i}: expected {} features, got {}",
                    self.n_features,
                    row.len()
                )));
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
                return Err(Error::Inference(format!(
                    "row {i}: non-finite feature value {bad}"
                )));
            }
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut votes = vec![0usize; self.n_classes];
                for tree in &self.trees {
                    votes[tree.predict_row(row)] += 1;
                }
                // Ties resolve to the smallest class index.
                votes
                    .iter()
                    .enumerate()
                    .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
                    .map_or(0, |(class, _)| class)
            })
            .collect())
    }
}

//! Trainer: hyperparameter sweeps and single-configuration runs
//!
//! The trainer owns a fixed train/test split for the lifetime of a sweep, so
//! every trial is scored on the same held-out rows. Each completed trial
//! appends exactly one run to the store; a trial whose fit fails is logged
//! and skipped without aborting the remaining trials.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::model::{accuracy, Hyperparams, RandomForest};
use crate::search::SearchSpace;
use crate::store::{RunRecord, RunStore};
use crate::{Error, Result};

/// Result of a hyperparameter sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best configuration seen; earliest trial wins ties.
    pub best_params: Hyperparams,
    /// Held-out accuracy of the best configuration.
    pub best_accuracy: f64,
    /// Trials that completed and appended a run.
    pub completed: usize,
    /// Trials whose fit failed and were skipped.
    pub failed: usize,
}

/// Result of a single-configuration run.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleOutcome {
    /// Run id of the appended record.
    pub run_id: String,
    /// Held-out accuracy, the metric recorded for selection.
    pub accuracy: f64,
    /// Mean k-fold cross-validation accuracy, when requested. Reported for
    /// generalization insight only; never used for selection.
    pub cv_accuracy: Option<f64>,
}

/// Options for [`Trainer::train_single`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainOptions {
    /// Standard deviation of additive gaussian noise applied to the training
    /// features before fitting. `None` disables the ablation.
    pub noise_std: Option<f64>,
    /// Number of cross-validation folds to report. `None` skips
    /// cross-validation.
    pub cv_folds: Option<usize>,
}

/// Offline trainer bound to one run store and one dataset split.
pub struct Trainer<'a, S: RunStore + ?Sized> {
    store: &'a S,
    full: Dataset,
    train: Dataset,
    test: Dataset,
}

impl<'a, S: RunStore + ?Sized> Trainer<'a, S> {
    /// Split `dataset` once and bind the trainer to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if the split is degenerate.
    pub fn new(store: &'a S, dataset: Dataset, test_fraction: f64, split_seed: u64) -> Result<Self> {
        let (train, test) = dataset.train_test_split(test_fraction, split_seed)?;
        Ok(Self {
            store,
            full: dataset,
            train,
            test,
        })
    }

    /// Fit one configuration and score it on the held-out split.
    fn fit_and_score(&self, params: &Hyperparams, train: &Dataset) -> Result<(RandomForest, f64)> {
        let forest = RandomForest::fit(train.features(), train.labels(), params)?;
        let predictions = forest.predict(self.test.features())?;
        Ok((forest, accuracy(&predictions, self.test.labels())))
    }

    /// Persist a finished attempt as exactly one run.
    fn record_run(
        &self,
        experiment: &str,
        params: &Hyperparams,
        forest: &RandomForest,
        score: f64,
    ) -> Result<String> {
        let artifact = self.store.put_artifact(forest)?;
        let record = RunRecord::new(experiment, params.clone(), score, artifact)?;
        let run_id = record.run_id().to_string();
        self.store.append(record)?;
        Ok(run_id)
    }

    /// Run `n_trials` independent trials sampled from `space`.
    ///
    /// Every completed trial appends exactly one run, including trials with
    /// degenerate metrics. A fit failure fails only its own trial. The best
    /// pair is tracked by linear scan with strict-greater comparison, so the
    /// earliest of tied trials wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for `n_trials == 0` or an empty search
    /// dimension, [`Error::Trial`] if every trial failed, and store errors if
    /// a run cannot be persisted.
    pub fn run_search(
        &self,
        experiment: &str,
        space: &SearchSpace,
        n_trials: usize,
        sweep_seed: u64,
    ) -> Result<SearchOutcome> {
        if n_trials == 0 {
            return Err(Error::InvalidInput("n_trials must be >= 1".into()));
        }

        let mut rng = StdRng::seed_from_u64(sweep_seed);
        let mut best: Option<(Hyperparams, f64)> = None;
        let mut completed = 0usize;
        let mut failed = 0usize;

        for trial in 1..=n_trials {
            let params = space.sample(&mut rng)?;
            match self.fit_and_score(&params, &self.train) {
                Ok((forest, score)) => {
                    self.record_run(experiment, &params, &forest, score)?;
                    completed += 1;
                    info!(
                        trial,
                        n_trials,
                        accuracy = score,
                        n_estimators = params.n_estimators,
                        max_depth = ?params.max_depth,
                        min_samples_split = params.min_samples_split,
                        min_samples_leaf = params.min_samples_leaf,
                        criterion = %params.criterion,
                        "trial complete"
                    );
                    if best.as_ref().map_or(true, |(_, b)| score > *b) {
                        best = Some((params, score));
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(trial, n_trials, error = %e, "trial failed, continuing sweep");
                }
            }
        }

        let (best_params, best_accuracy) = best.ok_or_else(|| {
            Error::Trial(format!("all {n_trials} trials failed, no run recorded"))
        })?;
        info!(
            experiment,
            completed,
            failed,
            best_accuracy,
            "sweep finished"
        );
        Ok(SearchOutcome {
            best_params,
            best_accuracy,
            completed,
            failed,
        })
    }

    /// Fit one named configuration and append exactly one run.
    ///
    /// Optionally perturbs the training features with additive gaussian noise
    /// and reports mean k-fold cross-validation accuracy over the full
    /// dataset. Neither option changes what is recorded as the run's metric:
    /// always the held-out accuracy of the (possibly noise-trained) model.
    ///
    /// # Errors
    ///
    /// Propagates fit, dataset, and store errors; single-configuration
    /// training has no catch-and-continue boundary.
    pub fn train_single(
        &self,
        experiment: &str,
        params: &Hyperparams,
        options: &TrainOptions,
    ) -> Result<SingleOutcome> {
        let train = match options.noise_std {
            Some(std_dev) => self.train.with_gaussian_noise(std_dev, params.seed)?,
            None => self.train.clone(),
        };
        let (forest, score) = self.fit_and_score(params, &train)?;

        let cv_accuracy = match options.cv_folds {
            Some(k) => Some(self.cross_validate(params, k)?),
            None => None,
        };
        if let Some(cv) = cv_accuracy {
            info!(cv_folds = ?options.cv_folds, cv_accuracy = cv, "cross-validation");
        }

        let run_id = self.record_run(experiment, params, &forest, score)?;
        info!(experiment, run_id = %run_id, accuracy = score, "single run recorded");
        Ok(SingleOutcome {
            run_id,
            accuracy: score,
            cv_accuracy,
        })
    }

    /// Mean accuracy over `k` folds of the full dataset.
    #[allow(clippy::cast_precision_loss)]
    fn cross_validate(&self, params: &Hyperparams, k: usize) -> Result<f64> {
        let folds = self.full.k_folds(k, params.seed)?;
        let mut total = 0.0;
        for (train, validation) in &folds {
            let forest = RandomForest::fit(train.features(), train.labels(), params)?;
            let predictions = forest.predict(validation.features())?;
            total += accuracy(&predictions, validation.labels());
        }
        Ok(total / k as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRunStore;

    fn trainer(store: &MemoryRunStore) -> Trainer<'_, MemoryRunStore> {
        Trainer::new(store, Dataset::iris().unwrap(), 0.2, 42).unwrap()
    }

    #[test]
    fn test_run_search_appends_one_run_per_trial() {
        let store = MemoryRunStore::new();
        let outcome = trainer(&store)
            .run_search("exp", &SearchSpace::default(), 4, 1)
            .unwrap();
        assert_eq!(outcome.completed, 4);
        assert_eq!(outcome.failed, 0);
        assert_eq!(store.search("exp").unwrap().len(), 4);
        assert_eq!(store.artifact_count(), 4);
    }

    #[test]
    fn test_run_search_best_matches_recorded_maximum() {
        let store = MemoryRunStore::new();
        let outcome = trainer(&store)
            .run_search("exp", &SearchSpace::default(), 5, 3)
            .unwrap();
        let max_recorded = store
            .search("exp")
            .unwrap()
            .iter()
            .map(crate::store::RunRecord::accuracy)
            .fold(f64::MIN, f64::max);
        assert!((outcome.best_accuracy - max_recorded).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_search_is_deterministic() {
        let store_a = MemoryRunStore::new();
        let store_b = MemoryRunStore::new();
        let a = trainer(&store_a)
            .run_search("exp", &SearchSpace::default(), 3, 5)
            .unwrap();
        let b = trainer(&store_b)
            .run_search("exp", &SearchSpace::default(), 3, 5)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_search_rejects_zero_trials() {
        let store = MemoryRunStore::new();
        let err = trainer(&store)
            .run_search("exp", &SearchSpace::default(), 0, 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_bad_configuration_fails_trial_not_sweep() {
        let store = MemoryRunStore::new();
        // min_samples_split of 1 is rejected by the forest; every sampled
        // configuration hits it, mixed with valid values.
        let space = SearchSpace::default().min_samples_split(vec![1, 2]);
        let outcome = trainer(&store).run_search("exp", &space, 6, 2).unwrap();
        assert_eq!(outcome.completed + outcome.failed, 6);
        assert!(outcome.failed > 0, "expected at least one failing trial");
        assert_eq!(store.search("exp").unwrap().len(), outcome.completed);
    }

    #[test]
    fn test_all_trials_failing_is_an_error() {
        let store = MemoryRunStore::new();
        let space = SearchSpace::default().min_samples_split(vec![0]);
        let err = trainer(&store)
            .run_search("exp", &space, 3, 2)
            .unwrap_err();
        assert!(matches!(err, Error::Trial(_)));
        assert!(store.search("exp").unwrap().is_empty());
    }

    #[test]
    fn test_train_single_records_one_run() {
        let store = MemoryRunStore::new();
        let outcome = trainer(&store)
            .train_single("exp", &Hyperparams::default(), &TrainOptions::default())
            .unwrap();
        let runs = store.search("exp").unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id(), outcome.run_id);
        assert!(outcome.cv_accuracy.is_none());
    }

    #[test]
    fn test_train_single_with_noise_and_cv() {
        let store = MemoryRunStore::new();
        let options = TrainOptions {
            noise_std: Some(0.1),
            cv_folds: Some(5),
        };
        let outcome = trainer(&store)
            .train_single("exp", &Hyperparams::default(), &options)
            .unwrap();
        assert_eq!(store.search("exp").unwrap().len(), 1);
        let cv = outcome.cv_accuracy.expect("cv requested");
        assert!((0.0..=1.0).contains(&cv));
        // Iris generalizes well even with mild noise.
        assert!(outcome.accuracy > 0.7);
    }

    #[test]
    fn test_cv_metric_is_not_the_recorded_metric() {
        let store = MemoryRunStore::new();
        let options = TrainOptions {
            noise_std: None,
            cv_folds: Some(3),
        };
        let outcome = trainer(&store)
            .train_single("exp", &Hyperparams::default(), &options)
            .unwrap();
        let runs = store.search("exp").unwrap();
        assert!((runs[0].accuracy() - outcome.accuracy).abs() < f64::EPSILON);
    }
}

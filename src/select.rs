//! Best-run selection
//!
//! A pure query over the run store: order an experiment's runs by accuracy
//! descending and take the head. The sort is stable, so runs tied on the
//! metric keep the store's insertion order and the earliest run wins.

use tracing::debug;

use crate::store::{ArtifactRef, RunRecord, RunStore};
use crate::{Error, Result};

/// The highest-accuracy run for `experiment`.
///
/// Repeated calls against an unchanged store return the same record. `NaN`
/// metrics sort below every real value via `total_cmp`.
///
/// # Errors
///
/// Returns [`Error::NoRunsFound`] when the experiment has zero runs, or the
/// store's own error if the query fails.
pub fn best_run<S: RunStore + ?Sized>(store: &S, experiment: &str) -> Result<RunRecord> {
    let mut runs = store.search(experiment)?;
    if runs.is_empty() {
        return Err(Error::NoRunsFound {
            experiment: experiment.to_string(),
        });
    }
    // NaN is the greatest value in total_cmp's total order, so a raw
    // descending sort would rank a NaN metric first. Pin it below every
    // real accuracy instead.
    let sort_key = |run: &RunRecord| {
        if run.accuracy().is_nan() {
            f64::NEG_INFINITY
        } else {
            run.accuracy()
        }
    };
    // Vec::sort_by is stable: ties keep insertion order.
    runs.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
    let best = runs.remove(0);
    debug!(
        experiment,
        run_id = best.run_id(),
        accuracy = best.accuracy(),
        candidates = runs.len() + 1,
        "selected best run"
    );
    Ok(best)
}

/// The artifact reference of the best run for `experiment`.
///
/// # Errors
///
/// Same failure modes as [`best_run`].
pub fn select_best<S: RunStore + ?Sized>(store: &S, experiment: &str) -> Result<ArtifactRef> {
    Ok(best_run(store, experiment)?.artifact().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hyperparams;
    use crate::store::MemoryRunStore;

    fn append_run(store: &MemoryRunStore, accuracy: f64) -> String {
        let record = RunRecord::new(
            "exp",
            Hyperparams::default(),
            accuracy,
            ArtifactRef::new(format!("artifact-{accuracy}")),
        )
        .unwrap();
        let id = record.run_id().to_string();
        store.append(record).unwrap();
        id
    }

    #[test]
    fn test_selects_strict_maximum() {
        let store = MemoryRunStore::new();
        append_run(&store, 0.92);
        let best_id = append_run(&store, 0.97);
        append_run(&store, 0.95);

        let best = best_run(&store, "exp").unwrap();
        assert_eq!(best.run_id(), best_id);
        assert_eq!(
            select_best(&store, "exp").unwrap(),
            ArtifactRef::new("artifact-0.97")
        );
    }

    #[test]
    fn test_empty_experiment_is_no_runs_found() {
        let store = MemoryRunStore::new();
        let err = select_best(&store, "X").unwrap_err();
        assert!(matches!(err, Error::NoRunsFound { experiment } if experiment == "X"));
    }

    #[test]
    fn test_tie_breaks_to_earliest_run() {
        let store = MemoryRunStore::new();
        let first_id = append_run(&store, 0.9);
        // Same accuracy, appended later.
        let record = RunRecord::new(
            "exp",
            Hyperparams::default(),
            0.9,
            ArtifactRef::new("later"),
        )
        .unwrap();
        store.append(record).unwrap();

        for _ in 0..5 {
            assert_eq!(best_run(&store, "exp").unwrap().run_id(), first_id);
        }
    }

    #[test]
    fn test_idempotent_on_unchanged_store() {
        let store = MemoryRunStore::new();
        append_run(&store, 0.5);
        append_run(&store, 0.8);
        let first = select_best(&store, "exp").unwrap();
        for _ in 0..10 {
            assert_eq!(select_best(&store, "exp").unwrap(), first);
        }
    }

    #[test]
    fn test_nan_metric_never_wins() {
        let store = MemoryRunStore::new();
        append_run(&store, f64::NAN);
        let best_id = append_run(&store, 0.1);
        assert_eq!(best_run(&store, "exp").unwrap().run_id(), best_id);

        // Order-independent: a NaN appended after the real run loses too.
        append_run(&store, f64::NAN);
        assert_eq!(best_run(&store, "exp").unwrap().run_id(), best_id);
    }

    #[test]
    fn test_all_nan_metrics_still_select_first_run() {
        let store = MemoryRunStore::new();
        let first_id = append_run(&store, f64::NAN);
        append_run(&store, f64::NAN);
        assert_eq!(best_run(&store, "exp").unwrap().run_id(), first_id);
    }
}

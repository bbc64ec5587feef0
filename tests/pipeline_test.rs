//! End-to-end tests for the train / select / serve handoff.
//!
//! Covers the full pipeline: sweep into a run store, select the best run,
//! start a predictor service, and answer requests against the wire payloads.

use irisflow::dataset::Dataset;
use irisflow::model::{Hyperparams, RandomForest};
use irisflow::search::SearchSpace;
use irisflow::select::{best_run, select_best};
use irisflow::serve::{PredictRequest, PredictorService};
use irisflow::store::{ArtifactRef, FsRunStore, MemoryRunStore, RunRecord, RunStore};
use irisflow::train::{TrainOptions, Trainer};
use irisflow::Error;

/// Append a run with a fixed accuracy and return its run id.
fn append_run(store: &dyn RunStore, accuracy: f64, artifact: &str) -> String {
    let record = RunRecord::new(
        "iris-rf",
        Hyperparams::default(),
        accuracy,
        ArtifactRef::new(artifact),
    )
    .unwrap();
    let id = record.run_id().to_string();
    store.append(record).unwrap();
    id
}

#[test]
fn test_selector_picks_highest_metric() {
    let store = MemoryRunStore::new();
    append_run(&store, 0.92, "artifact-a");
    let best_id = append_run(&store, 0.97, "artifact-b");
    append_run(&store, 0.95, "artifact-c");

    let best = best_run(&store, "iris-rf").unwrap();
    assert_eq!(best.run_id(), best_id);
    assert_eq!(
        select_best(&store, "iris-rf").unwrap(),
        ArtifactRef::new("artifact-b")
    );
}

#[test]
fn test_empty_store_yields_no_runs_found() {
    let store = MemoryRunStore::new();
    let err = select_best(&store, "X").unwrap_err();
    assert!(matches!(err, Error::NoRunsFound { experiment } if experiment == "X"));
}

#[test]
fn test_sweep_select_serve_roundtrip() {
    let store = MemoryRunStore::new();
    let trainer = Trainer::new(&store, Dataset::iris().unwrap(), 0.2, 42).unwrap();
    let outcome = trainer
        .run_search("iris-rf", &SearchSpace::default(), 5, 42)
        .unwrap();
    assert_eq!(outcome.completed, 5);

    // The service loads the run the selector points at.
    let best = best_run(&store, "iris-rf").unwrap();
    assert!((best.accuracy() - outcome.best_accuracy).abs() < f64::EPSILON);

    let service = PredictorService::start(&store, "iris-rf").unwrap();
    assert!(service.readiness());

    let request: PredictRequest =
        serde_json::from_str(r#"{"features": [[6.1, 3.5, 2.4, 0.2]]}"#).unwrap();
    let response = service.predict(&request).unwrap();
    assert_eq!(response.predictions.len(), 1);
    assert!(response.predictions[0] < 3);

    let body = serde_json::to_value(&response).unwrap();
    assert!(body.get("predictions").is_some());
}

#[test]
fn test_empty_features_is_a_400_with_message() {
    let store = MemoryRunStore::new();
    let trainer = Trainer::new(&store, Dataset::iris().unwrap(), 0.2, 42).unwrap();
    trainer
        .train_single("iris-rf", &Hyperparams::default(), &TrainOptions::default())
        .unwrap();

    let service = PredictorService::start(&store, "iris-rf").unwrap();
    let err = service
        .predict(&PredictRequest { features: vec![] })
        .unwrap_err();
    assert_eq!(err.status(), 400);
    assert!(!err.message().is_empty());
}

#[test]
fn test_train_and_serve_across_processes_through_fs_store() {
    let dir = tempfile::tempdir().unwrap();

    // Offline training process.
    {
        let store = FsRunStore::open(dir.path()).unwrap();
        let trainer = Trainer::new(&store, Dataset::iris().unwrap(), 0.2, 42).unwrap();
        trainer
            .run_search("iris-rf", &SearchSpace::default(), 3, 7)
            .unwrap();
    }

    // Serving process opens the same root fresh.
    let store = FsRunStore::open(dir.path()).unwrap();
    let service = PredictorService::start(&store, "iris-rf").unwrap();
    let response = service
        .predict(&PredictRequest {
            features: vec![vec![5.1, 3.5, 1.4, 0.2], vec![6.3, 3.3, 6.0, 2.5]],
        })
        .unwrap();
    assert_eq!(response.predictions.len(), 2);
}

#[test]
fn test_selection_ignores_other_experiments() {
    let store = MemoryRunStore::new();
    append_run(&store, 0.99, "other-artifact");
    let dataset = Dataset::iris().unwrap();
    let forest = RandomForest::fit(dataset.features(), dataset.labels(), &Hyperparams::default())
        .unwrap();
    let artifact = store.put_artifact(&forest).unwrap();
    let record = RunRecord::new("second-exp", Hyperparams::default(), 0.5, artifact.clone())
        .unwrap();
    store.append(record).unwrap();

    assert_eq!(select_best(&store, "second-exp").unwrap(), artifact);
}

#[test]
fn test_degenerate_metric_still_recorded_and_selectable() {
    let store = MemoryRunStore::new();
    let id = append_run(&store, 0.0, "only");
    let best = best_run(&store, "iris-rf").unwrap();
    assert_eq!(best.run_id(), id);
    assert!(best.accuracy().abs() < f64::EPSILON);
}

//! In-memory run store backed by `DashMap`.
//!
//! Data is lost on process restart; use [`super::FsRunStore`] for the
//! train-then-serve handoff across processes.

use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use super::{ArtifactRef, RunRecord, RunStore};
use crate::model::RandomForest;
use crate::{Error, Result};

/// Concurrent in-memory run store.
///
/// Runs are kept per experiment in insertion order; appends and reads from
/// different threads need no external locking.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: DashMap<String, Vec<RunRecord>>,
    run_ids: DashSet<String>,
    artifacts: DashMap<String, Vec<u8>>,
}

impl MemoryRunStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of runs across all experiments.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.run_ids.len()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the store holds no runs and no artifacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.run_ids.is_empty() && self.artifacts.is_empty()
    }
}

impl RunStore for MemoryRunStore {
    fn append(&self, record: RunRecord) -> Result<()> {
        if !self.run_ids.insert(record.run_id().to_string()) {
            return Err(Error::Store(format!(
                "run '{}' already exists",
                record.run_id()
            )));
        }
        self.runs
            .entry(record.experiment().to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    fn search(&self, experiment: &str) -> Result<Vec<RunRecord>> {
        Ok(self
            .runs
            .get(experiment)
            .map(|runs| runs.value().clone())
            .unwrap_or_default())
    }

    fn put_artifact(&self, model: &RandomForest) -> Result<ArtifactRef> {
        let handle = Uuid::new_v4().to_string();
        let payload = serde_json::to_vec(model)?;
        self.artifacts.insert(handle.clone(), payload);
        Ok(ArtifactRef::new(handle))
    }

    fn load_artifact(&self, artifact: &ArtifactRef) -> Result<RandomForest> {
        let payload = self
            .artifacts
            .get(artifact.as_str())
            .ok_or_else(|| Error::ArtifactLoad(format!("unknown artifact '{artifact}'")))?;
        serde_json::from_slice(payload.value())
            .map_err(|e| Error::ArtifactLoad(format!("artifact '{artifact}': {e}")))
    }
}

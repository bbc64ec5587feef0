//! Filesystem run store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/runs/<run_id>.json           one record per training attempt
//! <root>/artifacts/<handle>.json      serialized models
//! ```
//!
//! Writes go through a temp file plus rename so a crashed trainer never
//! leaves a half-written record for the selector to read.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{ArtifactRef, RunRecord, RunStore};
use crate::model::RandomForest;
use crate::{Error, Result};

/// Run store persisted as JSON files under a root directory.
///
/// The trainer and the predictor service open the same root in separate
/// processes; `search` re-reads the directory on every call.
#[derive(Debug)]
pub struct FsRunStore {
    runs_dir: PathBuf,
    artifacts_dir: PathBuf,
}

impl FsRunStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directories cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let runs_dir = root.join("runs");
        let artifacts_dir = root.join("artifacts");
        fs::create_dir_all(&runs_dir)?;
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self {
            runs_dir,
            artifacts_dir,
        })
    }

    /// Write `payload` to `path` via a temp file in the same directory.
    fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl RunStore for FsRunStore {
    fn append(&self, record: RunRecord) -> Result<()> {
        let path = self.runs_dir.join(format!("{}.json", record.run_id()));
        if path.exists() {
            return Err(Error::Store(format!(
                "run '{}' already exists",
                record.run_id()
            )));
        }
        let payload = serde_json::to_vec_pretty(&record)?;
        Self::write_atomic(&path, &payload)
    }

    fn search(&self, experiment: &str) -> Result<Vec<RunRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.runs_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let payload = fs::read(&path)?;
            let record: RunRecord = serde_json::from_slice(&payload).map_err(|e| {
                Error::Store(format!("corrupt run record {}: {e}", path.display()))
            })?;
            if record.experiment() == experiment {
                records.push(record);
            }
        }
        // Directory iteration order is arbitrary; recover insertion order
        // from the record timestamps.
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.run_id().cmp(b.run_id()))
        });
        Ok(records)
    }

    fn put_artifact(&self, model: &RandomForest) -> Result<ArtifactRef> {
        let handle = Uuid::new_v4().to_string();
        let path = self.artifacts_dir.join(format!("{handle}.json"));
        let payload = serde_json::to_vec(model)?;
        Self::write_atomic(&path, &payload)?;
        Ok(ArtifactRef::new(handle))
    }

    fn load_artifact(&self, artifact: &ArtifactRef) -> Result<RandomForest> {
        let path = self.artifacts_dir.join(format!("{}.json", artifact.as_str()));
        let payload = fs::read(&path)
            .map_err(|e| Error::ArtifactLoad(format!("artifact '{artifact}': {e}")))?;
        serde_json::from_slice(&payload)
            .map_err(|e| Error::ArtifactLoad(format!("artifact '{artifact}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::model::Hyperparams;

    fn fitted_forest() -> RandomForest {
        let dataset = Dataset::iris().unwrap();
        RandomForest::fit(dataset.features(), dataset.labels(), &Hyperparams::default()).unwrap()
    }

    #[test]
    fn test_open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let _store = FsRunStore::open(dir.path()).unwrap();
        assert!(dir.path().join("runs").is_dir());
        assert!(dir.path().join("artifacts").is_dir());
    }

    #[test]
    fn test_record_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::open(dir.path()).unwrap();
        let record = RunRecord::new(
            "exp",
            Hyperparams::default(),
            0.91,
            ArtifactRef::new("a"),
        )
        .unwrap();
        store.append(record.clone()).unwrap();

        let runs = store.search("exp").unwrap();
        assert_eq!(runs, vec![record]);
    }

    #[test]
    fn test_search_orders_by_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::open(dir.path()).unwrap();
        let mut expected_ids = Vec::new();
        for accuracy in [0.3, 0.9, 0.6] {
            let record = RunRecord::new(
                "exp",
                Hyperparams::default(),
                accuracy,
                ArtifactRef::new("a"),
            )
            .unwrap();
            expected_ids.push(record.run_id().to_string());
            store.append(record).unwrap();
        }

        let runs = store.search("exp").unwrap();
        let got_ids: Vec<&str> = runs.iter().map(RunRecord::run_id).collect();
        assert_eq!(got_ids, expected_ids);
    }

    #[test]
    fn test_reopen_sees_existing_runs() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsRunStore::open(dir.path()).unwrap();
            let record = RunRecord::new(
                "exp",
                Hyperparams::default(),
                0.8,
                ArtifactRef::new("a"),
            )
            .unwrap();
            store.append(record).unwrap();
        }
        let reopened = FsRunStore::open(dir.path()).unwrap();
        assert_eq!(reopened.search("exp").unwrap().len(), 1);
    }

    #[test]
    fn test_artifact_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::open(dir.path()).unwrap();
        let forest = fitted_forest();
        let artifact = store.put_artifact(&forest).unwrap();
        assert_eq!(store.load_artifact(&artifact).unwrap(), forest);
    }

    #[test]
    fn test_corrupt_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::open(dir.path()).unwrap();
        let path = dir.path().join("artifacts").join("bad.json");
        fs::write(&path, b"not json").unwrap();
        let err = store.load_artifact(&ArtifactRef::new("bad")).unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad(_)));
    }

    #[test]
    fn test_missing_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::open(dir.path()).unwrap();
        let err = store
            .load_artifact(&ArtifactRef::new("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad(_)));
    }
}

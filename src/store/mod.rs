//! Run Store - append-only records of training attempts
//!
//! Each training attempt becomes one [`RunRecord`] holding its
//! hyperparameters, held-out accuracy, and a reference to the serialized
//! model artifact. Records are appended once and never mutated or deleted;
//! a record is only written after its metric and artifact exist, so no
//! partial runs are ever queryable.
//!
//! Two backends implement [`RunStore`]: [`MemoryRunStore`] for tests and
//! single-process pipelines, and [`FsRunStore`] for the offline-train /
//! serve handoff through a shared directory.

mod fs;
mod memory;

pub use fs::FsRunStore;
pub use memory::MemoryRunStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Hyperparams, RandomForest};
use crate::{Error, Result};

/// Opaque handle to a stored model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// Wrap a store-assigned handle.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded training attempt.
///
/// Append-only: owned by the run store after creation, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    run_id: String,
    experiment: String,
    params: Hyperparams,
    accuracy: f64,
    artifact: ArtifactRef,
    created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Create a record with a fresh v4 run id and the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty experiment name.
    pub fn new(
        experiment: impl Into<String>,
        params: Hyperparams,
        accuracy: f64,
        artifact: ArtifactRef,
    ) -> Result<Self> {
        let experiment = experiment.into();
        if experiment.is_empty() {
            return Err(Error::InvalidInput("experiment name must be non-empty".into()));
        }
        Ok(Self {
            run_id: Uuid::new_v4().to_string(),
            experiment,
            params,
            accuracy,
            artifact,
            created_at: Utc::now(),
        })
    }

    /// Get the run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the hyperparameters of this attempt.
    #[must_use]
    pub const fn params(&self) -> &Hyperparams {
        &self.params
    }

    /// Get the held-out accuracy of this attempt.
    #[must_use]
    pub const fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Get the artifact reference.
    #[must_use]
    pub const fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only store of runs and their model artifacts.
///
/// Implementations must make `append` atomic per run and tolerate concurrent
/// appends and reads. `search` returns records in the store's native
/// insertion order; callers impose metric ordering on top.
pub trait RunStore: Send + Sync {
    /// Append one finalized run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the run id already exists or the backend
    /// cannot persist the record.
    fn append(&self, record: RunRecord) -> Result<()>;

    /// All runs for an experiment, in insertion order. Empty when the
    /// experiment has no runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the backend cannot be read.
    fn search(&self, experiment: &str) -> Result<Vec<RunRecord>>;

    /// Persist a fitted model, returning its opaque handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the backend cannot persist the artifact.
    fn put_artifact(&self, model: &RandomForest) -> Result<ArtifactRef>;

    /// Load a model by handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactLoad`] if the handle is unknown or the
    /// payload does not deserialize.
    fn load_artifact(&self, artifact: &ArtifactRef) -> Result<RandomForest>;
}

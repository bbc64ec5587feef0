//! Predictor service
//!
//! A stateless prediction front end over exactly one loaded model. The model
//! is selected and deserialized once at startup; after that the service is
//! read-only, so concurrent `predict` calls need no coordination. Transport
//! wiring is the caller's concern: this module defines the wire payloads and
//! the HTTP-equivalent status codes, not the listener.
//!
//! Two states exist: `Ready` (model loaded) and `Unavailable` (no model).
//! Startup failure policy belongs to the process boundary: [`PredictorService::start`]
//! returns the error and the serve binary exits with code 1, while callers
//! that prefer a degraded-but-alive instance can hold
//! [`PredictorService::unavailable`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::RandomForest;
use crate::select;
use crate::store::{ArtifactRef, RunStore};
use crate::{Error, Result};

/// Prediction request payload: one feature vector per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Ordered feature vectors to classify.
    pub features: Vec<Vec<f64>>,
}

/// Prediction response payload, aligned with the request rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted class label per input row.
    pub predictions: Vec<usize>,
}

/// Liveness payload. Reports that the process is up, not that a model is
/// loaded; see [`PredictorService::readiness`] for the latter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"running"`.
    pub status: String,
}

/// Error payload mirrored to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
}

/// A request-scoped failure with its HTTP-equivalent status code.
///
/// Request failures never change service state; the service stays `Ready`
/// after an inference error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: u16,
    message: String,
}

impl ApiError {
    /// HTTP-equivalent status code (400 client error, 500 server error).
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wire payload for this error.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.message.clone(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidInput(_) => 400,
            _ => 500,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

/// The in-process handle to the one model a service instance serves.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    forest: RandomForest,
    artifact: ArtifactRef,
}

impl LoadedModel {
    /// Wrap an already-deserialized model, e.g. a mock in tests.
    #[must_use]
    pub const fn new(forest: RandomForest, artifact: ArtifactRef) -> Self {
        Self { forest, artifact }
    }

    /// The artifact this model was loaded from.
    #[must_use]
    pub const fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }
}

#[derive(Debug)]
enum ServiceState {
    Ready(LoadedModel),
    Unavailable,
}

/// Stateless prediction service over one loaded model.
#[derive(Debug)]
pub struct PredictorService {
    state: ServiceState,
}

impl PredictorService {
    /// Select the best run for `experiment`, load its artifact, and enter
    /// `Ready`.
    ///
    /// This is the one-time blocking startup step; the model is never
    /// swapped within the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRunsFound`], [`Error::ArtifactLoad`], or a store
    /// error. The caller decides whether that is fatal; the serve binary
    /// exits with code 1.
    pub fn start<S: RunStore + ?Sized>(store: &S, experiment: &str) -> Result<Self> {
        let best = select::best_run(store, experiment)?;
        let forest = store.load_artifact(best.artifact())?;
        info!(
            experiment,
            run_id = best.run_id(),
            accuracy = best.accuracy(),
            artifact = %best.artifact(),
            "model loaded, service ready"
        );
        Ok(Self::with_model(LoadedModel::new(
            forest,
            best.artifact().clone(),
        )))
    }

    /// Build a `Ready` service around an injected model.
    #[must_use]
    pub const fn with_model(model: LoadedModel) -> Self {
        Self {
            state: ServiceState::Ready(model),
        }
    }

    /// Build a degraded instance with no model; every predict call answers
    /// with a 500 until the process is restarted.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            state: ServiceState::Unavailable,
        }
    }

    /// Readiness signal: whether a model is loaded.
    #[must_use]
    pub const fn readiness(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    /// Liveness probe; answers unconditionally once the process is up.
    #[must_use]
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "running".to_string(),
        }
    }

    /// Classify the request rows.
    ///
    /// # Errors
    ///
    /// - 500 when no model is loaded (checked first, so an unavailable
    ///   service answers 500 even for empty input)
    /// - 400 for an empty `features` payload
    /// - 500 when the model rejects the input; the service stays `Ready`
    pub fn predict(&self, request: &PredictRequest) -> std::result::Result<PredictResponse, ApiError> {
        let ServiceState::Ready(model) = &self.state else {
            return Err(ApiError {
                status: 500,
                message: "no model available for predictions".to_string(),
            });
        };
        if request.features.is_empty() {
            return Err(Error::InvalidInput("no features provided".into()).into());
        }
        let predictions = model.forest.predict(&request.features)?;
        Ok(PredictResponse { predictions })
    }
}

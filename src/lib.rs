//! # Irisflow: Train, Track, and Serve a Tabular Classifier
//!
//! Irisflow is a small offline-train-then-serve pipeline: it sweeps
//! hyperparameter configurations for a random-forest classifier, records
//! every attempt as an append-only run in a run store, selects the
//! best-performing run by held-out accuracy, and hands the winning model to
//! a stateless predictor service.
//!
//! ## Workflow
//!
//! ```rust
//! use irisflow::dataset::Dataset;
//! use irisflow::search::SearchSpace;
//! use irisflow::select::select_best;
//! use irisflow::serve::{PredictorService, PredictRequest};
//! use irisflow::store::MemoryRunStore;
//! use irisflow::train::Trainer;
//!
//! # fn main() -> irisflow::Result<()> {
//! let store = MemoryRunStore::new();
//! let dataset = Dataset::iris()?;
//!
//! // Offline: sweep configurations, one run appended per trial.
//! let trainer = Trainer::new(&store, dataset, 0.2, 42)?;
//! trainer.run_search("iris-rf", &SearchSpace::default(), 5, 42)?;
//!
//! // Serve: load the best run's artifact exactly once at startup.
//! let service = PredictorService::start(&store, "iris-rf")?;
//! let request = PredictRequest {
//!     features: vec![vec![6.1, 3.5, 2.4, 0.2]],
//! };
//! let response = service.predict(&request).expect("service is ready");
//! assert_eq!(response.predictions.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dataset;
pub mod error;
pub mod model;
pub mod search;
pub mod select;
pub mod serve;
pub mod store;
pub mod train;

pub use error::{Error, Result};

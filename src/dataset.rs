//! Tabular dataset loading and splitting
//!
//! Datasets are dense row-major feature matrices with integer class labels,
//! parsed from headered CSV where the last column is the label. Splitting is
//! seeded so training runs are reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::path::Path;

use crate::{Error, Result};

/// Bundled copy of the Iris measurements (150 rows, 4 features, 3 classes).
const IRIS_CSV: &str = include_str!("../data/iris.csv");

/// In-memory tabular dataset: feature rows plus aligned class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    n_features: usize,
}

impl Dataset {
    /// Build a dataset from parallel feature rows and labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if the rows and labels differ in length,
    /// the dataset is empty, or rows are ragged.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(Error::Dataset(format!(
                "feature rows ({}) and labels ({}) differ in length",
                features.len(),
                labels.len()
            )));
        }
        let Some(first) = features.first() else {
            return Err(Error::Dataset("empty dataset".into()));
        };
        let n_features = first.len();
        if n_features == 0 {
            return Err(Error::Dataset("rows have zero features".into()));
        }
        if let Some(bad) = features.iter().position(|row| row.len() != n_features) {
            return Err(Error::Dataset(format!(
                "ragged row {bad}: expected {n_features} features, got {}",
                features[bad].len()
            )));
        }
        Ok(Self {
            features,
            labels,
            n_features,
        })
    }

    /// Parse a headered CSV where the last column is the integer label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] on a missing header, a short row, or a
    /// non-numeric cell.
    pub fn from_csv_str(csv: &str) -> Result<Self> {
        let mut lines = csv.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| Error::Dataset("missing CSV header".into()))?;
        let n_columns = header.split(',').count();
        if n_columns < 2 {
            return Err(Error::Dataset(
                "CSV needs at least one feature column and a label column".into(),
            ));
        }

        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (line_no, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != n_columns {
                return Err(Error::Dataset(format!(
                    "row {}: expected {n_columns} columns, got {}",
                    line_no + 2,
                    cells.len()
                )));
            }
            let mut row = Vec::with_capacity(n_columns - 1);
            for cell in &cells[..n_columns - 1] {
                let value: f64 = cell.parse().map_err(|_| {
                    Error::Dataset(format!("row {}: non-numeric feature '{cell}'", line_no + 2))
                })?;
                row.push(value);
            }
            let label: usize = cells[n_columns - 1].parse().map_err(|_| {
                Error::Dataset(format!(
                    "row {}: non-integer label '{}'",
                    line_no + 2,
                    cells[n_columns - 1]
                ))
            })?;
            features.push(row);
            labels.push(label);
        }
        Self::new(features, labels)
    }

    /// Parse a headered CSV file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Dataset`]
    /// if it does not parse.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let csv = std::fs::read_to_string(path)?;
        Self::from_csv_str(&csv)
    }

    /// The bundled Iris dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] only if the bundled file is corrupt.
    pub fn iris() -> Result<Self> {
        Self::from_csv_str(IRIS_CSV)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the dataset has zero rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of feature columns.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes, taken as `max(label) + 1`.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |max| max + 1)
    }

    /// Feature rows.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Class labels aligned with [`Self::features`].
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Select the rows at `indices` into a new dataset.
    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            n_features: self.n_features,
        }
    }

    /// Seeded shuffle-and-split into `(train, test)`.
    ///
    /// The same `(test_fraction, seed)` pair always produces the same split.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if `test_fraction` is outside `(0, 1)` or
    /// either side of the split would be empty.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(Error::Dataset(format!(
                "test_fraction must be in (0, 1), got {test_fraction}"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_test = ((self.len() as f64) * test_fraction).round() as usize;
        if n_test == 0 || n_test == self.len() {
            return Err(Error::Dataset(format!(
                "test_fraction {test_fraction} leaves an empty split for {} rows",
                self.len()
            )));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);
        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    /// Seeded k-fold split: `k` disjoint `(train, validation)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if `k < 2` or there are fewer rows than
    /// folds.
    pub fn k_folds(&self, k: usize, seed: u64) -> Result<Vec<(Self, Self)>> {
        if k < 2 {
            return Err(Error::Dataset(format!("k_folds needs k >= 2, got {k}")));
        }
        if self.len() < k {
            return Err(Error::Dataset(format!(
                "cannot split {} rows into {k} folds",
                self.len()
            )));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let mut folds = Vec::with_capacity(k);
        for fold in 0..k {
            let validation: Vec<usize> = indices
                .iter()
                .copied()
                .skip(fold)
                .step_by(k)
                .collect();
            let train: Vec<usize> = indices
                .iter()
                .copied()
                .enumerate()
                .filter(|(pos, _)| pos % k != fold)
                .map(|(_, i)| i)
                .collect();
            folds.push((self.subset(&train), self.subset(&validation)));
        }
        Ok(folds)
    }

    /// Copy of the dataset with additive gaussian noise `N(0, std_dev)` on
    /// every feature value. Labels are untouched.
    ///
    /// This is a robustness ablation used by single-configuration training,
    /// not part of the search path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if `std_dev` is negative or non-finite.
    pub fn with_gaussian_noise(&self, std_dev: f64, seed: u64) -> Result<Self> {
        // Normal::new accepts a negative std_dev, so validate here.
        if !(std_dev >= 0.0 && std_dev.is_finite()) {
            return Err(Error::Dataset(format!(
                "noise std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        let normal = Normal::new(0.0, std_dev)
            .map_err(|e| Error::Dataset(format!("invalid noise std_dev {std_dev}: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);
        let features = self
            .features
            .iter()
            .map(|row| row.iter().map(|&v| v + normal.sample(&mut rng)).collect())
            .collect();
        Ok(Self {
            features,
            labels: self.labels.clone(),
            n_features: self.n_features,
        })
    }
}

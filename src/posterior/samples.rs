//! Posterior sample sets and their summaries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::primitives::Matrix;
use crate::stats::{column_means, column_stds, DescriptiveStats};

/// Per-parameter summary of a posterior: mean, median and a central
/// credible band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// Sample mean
    pub mean: f64,
    /// Sample median
    pub median: f64,
    /// Lower bound of the credible band
    pub lower: f64,
    /// Upper bound of the credible band
    pub upper: f64,
}

/// Posterior samples for one observed prediction.
///
/// Created fresh by every sampling call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSampleSet {
    /// One posterior draw per row (numSamples x P).
    samples: Matrix<f64>,
    /// Held-out rows eligible for resampling.
    neighbors: Vec<usize>,
}

impl PosteriorSampleSet {
    /// Wraps a sample matrix and the calibration rows it was drawn from.
    #[must_use]
    pub fn new(samples: Matrix<f64>, neighbors: Vec<usize>) -> Self {
        Self { samples, neighbors }
    }

    /// Concatenates several sets into one, e.g. to pool the posteriors of
    /// repeated observations of the same system.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty slice or sets with different P.
    pub fn pool(sets: &[PosteriorSampleSet]) -> Result<Self> {
        let first = sets
            .first()
            .ok_or_else(|| UqError::empty_input("posterior sample sets"))?;
        let n_params = first.n_params();
        let mut data = Vec::new();
        let mut neighbors = Vec::new();
        for set in sets {
            if set.n_params() != n_params {
                return Err(UqError::dimension_mismatch("parameters", n_params, set.n_params()));
            }
            data.extend_from_slice(set.samples.as_slice());
            neighbors.extend_from_slice(&set.neighbors);
        }
        neighbors.sort_unstable();
        neighbors.dedup();
        let rows = data.len() / n_params.max(1);
        Ok(Self {
            samples: Matrix::from_vec(rows, n_params, data)?,
            neighbors,
        })
    }

    /// Sample matrix (numSamples x P).
    #[must_use]
    pub fn samples(&self) -> &Matrix<f64> {
        &self.samples
    }

    /// Calibration rows eligible for resampling.
    #[must_use]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Number of draws.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.n_rows()
    }

    /// Parameter dimensionality P.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.samples.n_cols()
    }

    /// Per-parameter posterior mean.
    #[must_use]
    pub fn mean(&self) -> Vec<f64> {
        column_means(&self.samples)
    }

    /// Per-parameter posterior standard deviation (population).
    #[must_use]
    pub fn std(&self) -> Vec<f64> {
        column_stds(&self.samples, &self.mean())
    }

    /// Per-parameter R-7 quantile.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty set or `q` outside [0, 1].
    pub fn quantile(&self, q: f64) -> Result<Vec<f64>> {
        (0..self.n_params())
            .map(|p| DescriptiveStats::new(&self.samples.column(p)).quantile(q))
            .collect()
    }

    /// Per-parameter central credible interval holding `level` of the mass.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` unless `level` is in (0, 1).
    pub fn credible_interval(&self, level: f64) -> Result<Vec<(f64, f64)>> {
        let tail = Self::tail_percent(level)?;
        (0..self.n_params())
            .map(|p| {
                let b = DescriptiveStats::new(&self.samples.column(p))
                    .percentiles(&[tail, 100.0 - tail])?;
                Ok((b[0], b[1]))
            })
            .collect()
    }

    /// Mean, median and 95% band for every parameter.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty set.
    pub fn summary(&self) -> Result<Vec<ParameterSummary>> {
        self.summary_at(0.95)
    }

    /// Mean, median and `level` band for every parameter.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty set or an invalid level.
    pub fn summary_at(&self, level: f64) -> Result<Vec<ParameterSummary>> {
        let tail = Self::tail_percent(level)?;
        let means = self.mean();
        (0..self.n_params())
            .map(|p| {
                let column = self.samples.column(p);
                let b = DescriptiveStats::new(&column).percentiles(&[tail, 50.0, 100.0 - tail])?;
                Ok(ParameterSummary {
                    mean: means[p],
                    median: b[1],
                    lower: b[0],
                    upper: b[2],
                })
            })
            .collect()
    }

    fn tail_percent(level: f64) -> Result<f64> {
        if !(level > 0.0 && level < 1.0) {
            return Err(UqError::invalid_hyperparameter(
                "credible_level",
                level,
                "in (0, 1)",
            ));
        }
        Ok((1.0 - level) * 50.0)
    }
}

//! Per-parameter tolerance-window sampler.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{Result, UqError};
use crate::primitives::Matrix;
use crate::stats::column_ranges;

use super::calibration::CalibrationModel;
use super::sampler::{check_num_samples, row_seed, PosteriorSampler};
use super::samples::PosteriorSampleSet;

/// Default window half-width as a fraction of each parameter's predicted
/// range.
pub const DEFAULT_RANGE_FRACTION: f64 = 1.0 / 20.0;

/// Samples every parameter independently from the held-out realizations
/// whose prediction for that parameter lies within ±W of the observed
/// prediction (an empirical conditional CDF per parameter).
///
/// When no held-out prediction falls inside the window, the whole held-out
/// set is used for that parameter and a warning is logged.
///
/// # Example
///
/// ```
/// use mcuq::posterior::{CalibrationModel, MarginalWindowSampler, PosteriorSampler};
/// use mcuq::primitives::Matrix;
///
/// let truth = Matrix::from_vec(4, 1, vec![10.0, 20.0, 30.0, 40.0]).expect("4x1");
/// let predicted = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("4x1");
/// let model = CalibrationModel::calibrate(&truth, &predicted).expect("aligned");
///
/// let sampler = MarginalWindowSampler::new()
///     .with_tolerances(vec![0.5])
///     .with_random_state(1);
/// let query = Matrix::from_vec(1, 1, vec![2.2]).expect("1x1");
/// let sets = sampler.sample(&model, &query, 20).expect("sampling succeeds");
/// assert!(sets[0].samples().as_slice().iter().all(|&v| v == 20.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalWindowSampler {
    tolerances: Option<Vec<f64>>,
    range_fraction: f64,
    random_state: Option<u64>,
}

impl Default for MarginalWindowSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MarginalWindowSampler {
    /// Sampler with windows of 1/20 of each parameter's predicted range.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerances: None,
            range_fraction: DEFAULT_RANGE_FRACTION,
            random_state: None,
        }
    }

    /// Uses explicit per-parameter half-widths instead of the default.
    #[must_use]
    pub fn with_tolerances(mut self, tolerances: Vec<f64>) -> Self {
        self.tolerances = Some(tolerances);
        self
    }

    /// Sets the fraction of the predicted range used for default windows.
    #[must_use]
    pub fn with_range_fraction(mut self, fraction: f64) -> Self {
        self.range_fraction = fraction;
        self
    }

    /// Fixes the random seed for reproducible draws.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Window half-widths derived from the held-out predictions:
    /// `range_fraction * (max - min)` per parameter.
    #[must_use]
    pub fn default_tolerances(&self, model: &CalibrationModel) -> Vec<f64> {
        column_ranges(model.predicted())
            .into_iter()
            .map(|(lo, hi)| self.range_fraction * (hi - lo))
            .collect()
    }

    fn resolve_tolerances(&self, model: &CalibrationModel) -> Result<Vec<f64>> {
        if !(self.range_fraction >= 0.0 && self.range_fraction.is_finite()) {
            return Err(UqError::invalid_hyperparameter(
                "range_fraction",
                self.range_fraction,
                "finite and >= 0",
            ));
        }
        let tolerances = match &self.tolerances {
            Some(t) => t.clone(),
            None => self.default_tolerances(model),
        };
        if tolerances.len() != model.n_params() {
            return Err(UqError::dimension_mismatch(
                "tolerances",
                model.n_params(),
                tolerances.len(),
            ));
        }
        if let Some(bad) = tolerances.iter().find(|w| !(**w >= 0.0 && w.is_finite())) {
            return Err(UqError::invalid_hyperparameter(
                "tolerance",
                bad,
                "finite and >= 0",
            ));
        }
        Ok(tolerances)
    }

    fn sample_row(
        model: &CalibrationModel,
        row: usize,
        query: &[f64],
        tolerances: &[f64],
        num_samples: usize,
        seed: u64,
    ) -> Result<PosteriorSampleSet> {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_params = model.n_params();
        let predicted = model.predicted();
        let truth = model.truth();

        let mut data = vec![0.0; num_samples * n_params];
        let mut eligible = Vec::new();
        for p in 0..n_params {
            let mut window: Vec<usize> = (0..model.n_samples())
                .filter(|&j| (predicted.get(j, p) - query[p]).abs() <= tolerances[p])
                .collect();
            if window.is_empty() {
                tracing::warn!(
                    row,
                    param = p,
                    tolerance = tolerances[p],
                    "no held-out predictions within tolerance; sampling from the full held-out set"
                );
                window = (0..model.n_samples()).collect();
            }
            for s in 0..num_samples {
                let j = window[rng.gen_range(0..window.len())];
                data[s * n_params + p] = truth.get(j, p);
            }
            eligible.extend_from_slice(&window);
        }
        eligible.sort_unstable();
        eligible.dedup();

        Ok(PosteriorSampleSet::new(
            Matrix::from_vec(num_samples, n_params, data)?,
            eligible,
        ))
    }
}

impl PosteriorSampler for MarginalWindowSampler {
    /// # Errors
    ///
    /// - `DimensionMismatch` if the prediction width or the tolerance count
    ///   is not P.
    /// - `InvalidHyperparameter` for negative tolerances or zero samples.
    /// - `NonFiniteValue` for a NaN or infinite prediction.
    fn sample(
        &self,
        model: &CalibrationModel,
        predicted_from_data: &Matrix<f64>,
        num_samples: usize,
    ) -> Result<Vec<PosteriorSampleSet>> {
        check_num_samples(num_samples)?;
        if predicted_from_data.n_cols() != model.n_params() {
            return Err(UqError::dimension_mismatch(
                "parameters",
                model.n_params(),
                predicted_from_data.n_cols(),
            ));
        }
        UqError::ensure_finite("observed predictions", predicted_from_data)?;
        let tolerances = self.resolve_tolerances(model)?;
        let base = self.random_state.unwrap_or_else(|| rand::thread_rng().gen());

        (0..predicted_from_data.n_rows())
            .into_par_iter()
            .map(|i| {
                Self::sample_row(
                    model,
                    i,
                    predicted_from_data.row(i),
                    &tolerances,
                    num_samples,
                    row_seed(base, i),
                )
            })
            .collect()
    }
}

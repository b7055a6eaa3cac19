//! Nearest-neighbor empirical posterior sampler.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::error::{Result, UqError};
use crate::neighbors::k_nearest;
use crate::primitives::Matrix;
use crate::traits::InverseMapping;

use super::calibration::CalibrationModel;
use super::policy::{Jitter, NeighborPolicy};
use super::samples::PosteriorSampleSet;

/// Common interface of the empirical posterior samplers.
pub trait PosteriorSampler {
    /// Draws `num_samples` posterior samples for every row of
    /// `predicted_from_data` (the inverse mapping applied to observed data).
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs do not match the calibration model or
    /// the sampler is misconfigured.
    fn sample(
        &self,
        model: &CalibrationModel,
        predicted_from_data: &Matrix<f64>,
        num_samples: usize,
    ) -> Result<Vec<PosteriorSampleSet>>;

    /// Applies `mapping` to raw observed data, then samples.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the mapping does not return one row
    /// per observation, plus any error from the mapping or `sample`.
    fn sample_with_mapping<M: InverseMapping + ?Sized>(
        &self,
        model: &CalibrationModel,
        mapping: &M,
        observed_data: &Matrix<f64>,
        num_samples: usize,
    ) -> Result<Vec<PosteriorSampleSet>>
    where
        Self: Sized,
    {
        let predicted = mapping.predict(observed_data)?;
        if predicted.n_rows() != observed_data.n_rows() {
            return Err(UqError::dimension_mismatch(
                "mapping output rows",
                observed_data.n_rows(),
                predicted.n_rows(),
            ));
        }
        self.sample(model, &predicted, num_samples)
    }
}

/// Seed for observed row `row`; rows own independent streams so they can
/// run in any order.
pub(crate) fn row_seed(base: u64, row: usize) -> u64 {
    base.wrapping_add((row as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

pub(crate) fn check_num_samples(num_samples: usize) -> Result<()> {
    if num_samples == 0 {
        return Err(UqError::invalid_hyperparameter("num_samples", 0, ">= 1"));
    }
    Ok(())
}

/// Resamples the true parameters of held-out realizations whose predicted
/// parameters are nearest to each observation's predicted parameters.
///
/// Local error statistics of the inverse mapping in predicted-parameter
/// space stand in for the posterior, so no likelihood or second training
/// pass is needed.
///
/// # Example
///
/// ```
/// use mcuq::posterior::{CalibrationModel, EmpiricalPosteriorSampler, NeighborPolicy, PosteriorSampler};
/// use mcuq::primitives::Matrix;
///
/// let truth = Matrix::from_vec(6, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).expect("6x1");
/// let predicted = Matrix::from_vec(6, 1, vec![0.1, 0.9, 2.2, 2.9, 4.1, 5.2]).expect("6x1");
/// let model = CalibrationModel::calibrate(&truth, &predicted).expect("aligned");
///
/// let sampler = EmpiricalPosteriorSampler::new()
///     .with_policy(NeighborPolicy::new(2))
///     .with_random_state(7);
/// let query = Matrix::from_vec(1, 1, vec![2.0]).expect("1x1");
/// let sets = sampler.sample(&model, &query, 100).expect("sampling succeeds");
///
/// assert_eq!(sets[0].n_samples(), 100);
/// assert!(sets[0].samples().as_slice().iter().all(|&v| v == 2.0 || v == 3.0 || v == 1.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmpiricalPosteriorSampler {
    policy: NeighborPolicy,
    random_state: Option<u64>,
}

impl EmpiricalPosteriorSampler {
    /// Sampler with the default policy (10 Euclidean neighbors, uniform,
    /// no jitter) and an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the neighborhood policy.
    #[must_use]
    pub fn with_policy(mut self, policy: NeighborPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fixes the random seed for reproducible draws.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Returns the neighborhood policy.
    #[must_use]
    pub fn policy(&self) -> &NeighborPolicy {
        &self.policy
    }

    fn sample_row(
        &self,
        model: &CalibrationModel,
        query: &[f64],
        standardized_query: &[f64],
        num_samples: usize,
        seed: u64,
    ) -> Result<PosteriorSampleSet> {
        let mut rng = StdRng::seed_from_u64(seed);
        let neighbors = k_nearest(
            standardized_query,
            model.standardized_predictions(),
            self.policy.k,
            self.policy.metric,
        )?;
        let weights = self.policy.weighting.weights(&neighbors);
        let picker = WeightedIndex::new(&weights)
            .map_err(|e| UqError::Other(format!("invalid neighbor weights: {e}")))?;

        let indices: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
        let local_std = match self.policy.jitter {
            Jitter::Gaussian { scale } => model
                .residual_std(&indices)
                .into_iter()
                .map(|s| s * scale)
                .collect(),
            _ => Vec::new(),
        };

        let n_params = model.n_params();
        let truth = model.truth();
        let residuals = model.residuals();
        let mut data = Vec::with_capacity(num_samples * n_params);
        for _ in 0..num_samples {
            let j = indices[picker.sample(&mut rng)];
            match self.policy.jitter {
                Jitter::None => data.extend_from_slice(truth.row(j)),
                Jitter::ResidualShift => data.extend(
                    query
                        .iter()
                        .zip(residuals.row(j))
                        .map(|(q, r)| q + r),
                ),
                Jitter::Gaussian { .. } => {
                    for (t, s) in truth.row(j).iter().zip(&local_std) {
                        let z: f64 = rng.sample(StandardNormal);
                        data.push(t + s * z);
                    }
                }
            }
        }

        Ok(PosteriorSampleSet::new(
            Matrix::from_vec(num_samples, n_params, data)?,
            indices,
        ))
    }
}

impl PosteriorSampler for EmpiricalPosteriorSampler {
    /// # Errors
    ///
    /// - `InsufficientCalibrationData` if the policy's K exceeds the number
    ///   of calibration rows.
    /// - `DimensionMismatch` if the prediction width is not P.
    /// - `InvalidHyperparameter` for an invalid policy or zero samples.
    /// - `NonFiniteValue` for a NaN or infinite prediction.
    fn sample(
        &self,
        model: &CalibrationModel,
        predicted_from_data: &Matrix<f64>,
        num_samples: usize,
    ) -> Result<Vec<PosteriorSampleSet>> {
        self.policy.validate()?;
        check_num_samples(num_samples)?;
        if self.policy.k > model.n_samples() {
            return Err(UqError::InsufficientCalibrationData {
                required: self.policy.k,
                available: model.n_samples(),
            });
        }
        let standardized = model.standardize(predicted_from_data)?;
        let base = self.random_state.unwrap_or_else(|| rand::thread_rng().gen());

        tracing::debug!(
            n_queries = predicted_from_data.n_rows(),
            k = self.policy.k,
            num_samples,
            "sampling empirical posterior"
        );

        (0..predicted_from_data.n_rows())
            .into_par_iter()
            .map(|i| {
                self.sample_row(
                    model,
                    predicted_from_data.row(i),
                    standardized.row(i),
                    num_samples,
                    row_seed(base, i),
                )
            })
            .collect()
    }
}

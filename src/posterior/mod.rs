//! Empirical posterior sampling.
//!
//! A trained inverse mapping (data in, parameters out) is calibrated on
//! held-out prior realizations whose true parameters are known. For a new
//! observation, the posterior over parameters is approximated by resampling
//! the true parameters of held-out realizations whose *predicted*
//! parameters are close to the observation's predicted parameters.
//!
//! Two samplers share the [`PosteriorSampler`] trait:
//!
//! - [`EmpiricalPosteriorSampler`]: K nearest neighbors in standardized
//!   predicted-parameter space, jointly over all parameters.
//! - [`MarginalWindowSampler`]: an independent tolerance window per
//!   parameter.
//!
//! # Example
//!
//! ```
//! use mcuq::posterior::{CalibrationModel, EmpiricalPosteriorSampler, NeighborPolicy, PosteriorSampler};
//! use mcuq::primitives::Matrix;
//!
//! // Predictions are the truth shifted by +0.5.
//! let truth: Vec<f64> = (0..20).map(f64::from).collect();
//! let predicted: Vec<f64> = truth.iter().map(|t| t + 0.5).collect();
//! let model = CalibrationModel::calibrate(
//!     &Matrix::from_vec(20, 1, truth).expect("20x1"),
//!     &Matrix::from_vec(20, 1, predicted).expect("20x1"),
//! ).expect("aligned");
//!
//! let sampler = EmpiricalPosteriorSampler::new()
//!     .with_policy(NeighborPolicy::new(1))
//!     .with_random_state(42);
//! let observed = Matrix::from_vec(1, 1, vec![10.5]).expect("1x1");
//! let sets = sampler.sample(&model, &observed, 10).expect("sample");
//! assert!(sets[0].samples().as_slice().iter().all(|&v| v == 10.0));
//! ```

mod calibration;
mod policy;
mod sampler;
mod samples;
mod window;

pub use calibration::CalibrationModel;
pub use policy::{Jitter, NeighborPolicy};
pub use sampler::{EmpiricalPosteriorSampler, PosteriorSampler};
pub use samples::{ParameterSummary, PosteriorSampleSet};
pub use window::{MarginalWindowSampler, DEFAULT_RANGE_FRACTION};

//! mcuq: Monte Carlo uncertainty quantification for inverse problems.
//!
//! Two composable stages work on a prior ensemble of simulated data:
//!
//! 1. **Prior falsification**: observed data and the prior ensemble are
//!    projected onto principal components fitted on the prior. If the
//!    observations leave the prior's envelope, the prior is rejected.
//! 2. **Empirical posterior sampling**: an externally trained inverse
//!    mapping is calibrated on held-out prior realizations, and the true
//!    parameters of realizations whose predictions resemble the observed
//!    prediction are resampled as the posterior.
//!
//! # Quick Start
//!
//! ```
//! use mcuq::prelude::*;
//!
//! // Prior: data = [theta, 3 theta]; the mapping recovers theta.
//! let thetas: Vec<f64> = (0..50).map(f64::from).collect();
//! let data: Vec<f64> = thetas.iter().flat_map(|t| [*t, 3.0 * t]).collect();
//! let prior = Matrix::from_vec(50, 2, data).expect("50x2");
//! let params = Matrix::from_vec(50, 1, thetas).expect("50x1");
//! let mapping = |x: &Matrix<f64>| -> mcuq::Result<Matrix<f64>> {
//!     Ok(Matrix::from_vec(x.n_rows(), 1, x.column(0))?)
//! };
//!
//! let observed = Matrix::from_vec(1, 2, vec![21.0, 63.0]).expect("1x2");
//!
//! let basis = PcaBasis::fit(&prior, 1).expect("fit");
//! let report = PriorFalsification::new()
//!     .evaluate(&basis, &prior, &observed)
//!     .expect("evaluate");
//! assert!(report.is_consistent());
//!
//! let model = CalibrationModel::from_mapping(&mapping, &prior, &params).expect("calibrate");
//! let sampler = EmpiricalPosteriorSampler::new()
//!     .with_policy(NeighborPolicy::new(5))
//!     .with_random_state(42);
//! let posterior = sampler
//!     .sample_with_mapping(&model, &mapping, &observed, 500)
//!     .expect("sample");
//! let summary = posterior[0].summary().expect("summary");
//! assert!(summary[0].lower >= 19.0 && summary[0].upper <= 23.0);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Row-major `Matrix` (realizations as rows)
//! - [`falsification`]: PCA basis and prior falsification
//! - [`posterior`]: Calibration model and empirical posterior samplers
//! - [`workflow`]: Falsify-then-sample driver
//! - [`neighbors`]: Distance metrics, k-nearest search, kernel weights
//! - [`preprocessing`]: Standardization
//! - [`stats`]: Descriptive statistics and quantiles

pub mod error;
pub mod falsification;
pub mod neighbors;
pub mod posterior;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod stats;
pub mod traits;
pub mod workflow;

pub use error::{Result, UqError};
pub use primitives::Matrix;
pub use traits::{InverseMapping, Transformer};

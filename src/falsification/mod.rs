//! PCA-based prior falsification.
//!
//! Checks whether observed data is plausible under a Monte Carlo prior
//! ensemble: both are projected onto principal components fitted on the
//! prior, and on every retained axis the observed scores are compared
//! against an envelope of the prior scores.
//!
//! # Example
//!
//! ```
//! use mcuq::falsification::{PcaBasis, PriorFalsification};
//! use mcuq::primitives::Matrix;
//!
//! let prior = Matrix::from_vec(5, 2, vec![
//!     0.0, 0.0,
//!     1.0, 1.1,
//!     2.0, 1.9,
//!     3.0, 3.2,
//!     4.0, 4.0,
//! ]).expect("5x2");
//! let basis = PcaBasis::fit(&prior, 1).expect("fit");
//!
//! let inside = Matrix::from_vec(1, 2, vec![2.5, 2.5]).expect("1x2");
//! let outside = Matrix::from_vec(1, 2, vec![40.0, 40.0]).expect("1x2");
//!
//! let pf = PriorFalsification::new();
//! assert!(pf.evaluate(&basis, &prior, &inside).expect("evaluate").is_consistent());
//! assert!(!pf.evaluate(&basis, &prior, &outside).expect("evaluate").is_consistent());
//! ```

mod basis;
mod config;
mod report;

pub use basis::PcaBasis;
pub use config::{ConsistencyRule, Envelope, FalsificationConfig};
pub use report::{ComponentCheck, FalsificationReport};

use crate::error::{Result, UqError};
use crate::primitives::Matrix;
use crate::stats::DescriptiveStats;

/// Evaluates observed data against a prior ensemble in PCA score space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorFalsification {
    config: FalsificationConfig,
}

impl PriorFalsification {
    /// Creates an evaluator with the min/max envelope and the
    /// all-components rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: FalsificationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the envelope.
    #[must_use]
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.config.envelope = envelope;
        self
    }

    /// Sets the consistency rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ConsistencyRule) -> Self {
        self.config.rule = rule;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &FalsificationConfig {
        &self.config
    }

    /// Projects `prior` and `observed` with `basis` and scores every
    /// retained component.
    ///
    /// A single observed row is a valid one-row ensemble. On an axis where
    /// the prior has zero spread, any observed deviation fails that axis.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if either input is empty or has a width other
    ///   than the basis feature count.
    /// - `InvalidHyperparameter` if the configuration is invalid for this
    ///   basis.
    /// - `NonFiniteValue` if either input holds a NaN or infinity.
    pub fn evaluate(
        &self,
        basis: &PcaBasis,
        prior: &Matrix<f64>,
        observed: &Matrix<f64>,
    ) -> Result<FalsificationReport> {
        self.config.validate(basis.n_components())?;
        if prior.is_empty() {
            return Err(UqError::empty_input("prior ensemble"));
        }
        if observed.is_empty() {
            return Err(UqError::empty_input("observed data"));
        }
        UqError::ensure_finite("prior ensemble", prior)?;
        UqError::ensure_finite("observed data", observed)?;

        let prior_scores = basis.project(prior)?;
        let observed_scores = basis.project(observed)?;

        let mut components = Vec::with_capacity(basis.n_components());
        for (k, &ratio) in basis.explained_variance_ratio().iter().enumerate() {
            let (lower, upper) = self.config.envelope.bounds(&prior_scores.column(k))?;
            let observed_axis = observed_scores.column(k);
            let (observed_min, observed_max) = DescriptiveStats::new(&observed_axis)
                .min_max()
                .ok_or_else(|| UqError::empty_input("observed scores"))?;

            let mut n_outside = 0;
            let mut margin = 0.0_f64;
            for &s in &observed_axis {
                let outside_by = (lower - s).max(s - upper);
                if outside_by > 0.0 {
                    n_outside += 1;
                    margin = margin.max(outside_by);
                }
            }

            components.push(ComponentCheck {
                component: k,
                explained_variance_ratio: ratio,
                lower,
                upper,
                observed_min,
                observed_max,
                n_outside,
                margin,
                within: n_outside == 0,
            });
        }

        let consistent = self.config.rule.is_consistent(&components);
        tracing::debug!(
            consistent,
            n_prior = prior.n_rows(),
            n_observed = observed.n_rows(),
            failing = components.iter().filter(|c| !c.within).count(),
            "prior falsification verdict"
        );

        Ok(FalsificationReport {
            components,
            consistent,
            envelope: self.config.envelope,
            rule: self.config.rule,
            n_prior: prior.n_rows(),
            n_observed: observed.n_rows(),
        })
    }

    /// Fits a basis with `n_components` on `prior` and evaluates
    /// `observed` against it.
    ///
    /// # Errors
    ///
    /// Propagates errors from `PcaBasis::fit` and `evaluate`.
    pub fn fit_evaluate(
        &self,
        prior: &Matrix<f64>,
        observed: &Matrix<f64>,
        n_components: usize,
    ) -> Result<(PcaBasis, FalsificationReport)> {
        let basis = PcaBasis::fit(prior, n_components)?;
        let report = self.evaluate(&basis, prior, observed)?;
        Ok((basis, report))
    }
}

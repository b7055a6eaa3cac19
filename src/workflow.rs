//! Gate-then-sample uncertainty quantification.
//!
//! Prior falsification runs first. Only when the observations are
//! consistent with the prior ensemble is the inverse mapping calibrated on
//! held-out realizations and the empirical posterior sampled.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::falsification::{FalsificationConfig, FalsificationReport, PriorFalsification};
use crate::posterior::{
    CalibrationModel, EmpiricalPosteriorSampler, NeighborPolicy, PosteriorSampleSet,
    PosteriorSampler,
};
use crate::primitives::Matrix;
use crate::traits::InverseMapping;

/// Result of a workflow run.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// The observations fall outside the prior; no posterior was computed.
    Falsified(FalsificationReport),
    /// The prior passed and posteriors were sampled for every observation.
    Posterior {
        /// Falsification verdict that gated sampling
        report: FalsificationReport,
        /// One sample set per observed row
        posteriors: Vec<PosteriorSampleSet>,
    },
}

impl WorkflowOutcome {
    /// Falsification report, present in both outcomes.
    #[must_use]
    pub fn report(&self) -> &FalsificationReport {
        match self {
            WorkflowOutcome::Falsified(report) | WorkflowOutcome::Posterior { report, .. } => {
                report
            }
        }
    }

    /// Posterior sample sets, if the prior passed.
    #[must_use]
    pub fn posteriors(&self) -> Option<&[PosteriorSampleSet]> {
        match self {
            WorkflowOutcome::Falsified(_) => None,
            WorkflowOutcome::Posterior { posteriors, .. } => Some(posteriors),
        }
    }

    /// True when the prior was rejected.
    #[must_use]
    pub fn is_falsified(&self) -> bool {
        matches!(self, WorkflowOutcome::Falsified(_))
    }
}

/// Configuration of the two-stage workflow.
///
/// # Example
///
/// ```
/// use mcuq::posterior::NeighborPolicy;
/// use mcuq::primitives::Matrix;
/// use mcuq::workflow::UqWorkflow;
///
/// // Data is [theta, theta + 1]; the mapping reads theta back from column 0.
/// let thetas: Vec<f64> = (0..30).map(f64::from).collect();
/// let data: Vec<f64> = thetas.iter().flat_map(|t| [*t, t + 1.0]).collect();
/// let prior = Matrix::from_vec(30, 2, data).expect("30x2");
/// let params = Matrix::from_vec(30, 1, thetas).expect("30x1");
/// let mapping = |x: &Matrix<f64>| -> mcuq::Result<Matrix<f64>> {
///     Ok(Matrix::from_vec(x.n_rows(), 1, x.column(0))?)
/// };
///
/// let observed = Matrix::from_vec(1, 2, vec![12.0, 13.0]).expect("1x2");
/// let outcome = UqWorkflow::new(1)
///     .with_policy(NeighborPolicy::new(3))
///     .with_random_state(0)
///     .run(&prior, &observed, &prior, &params, &mapping, 100)
///     .expect("workflow runs");
///
/// let posteriors = outcome.posteriors().expect("prior is consistent");
/// assert!((posteriors[0].mean()[0] - 12.0).abs() <= 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UqWorkflow {
    n_components: usize,
    falsification: FalsificationConfig,
    policy: NeighborPolicy,
    random_state: Option<u64>,
}

impl UqWorkflow {
    /// Workflow retaining `n_components` principal components, with the
    /// default falsification config and neighborhood policy.
    #[must_use]
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            falsification: FalsificationConfig::default(),
            policy: NeighborPolicy::default(),
            random_state: None,
        }
    }

    /// Sets the falsification envelope and rule.
    #[must_use]
    pub fn with_falsification(mut self, config: FalsificationConfig) -> Self {
        self.falsification = config;
        self
    }

    /// Sets the posterior neighborhood policy.
    #[must_use]
    pub fn with_policy(mut self, policy: NeighborPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fixes the sampling seed.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Runs falsification on `prior_data` vs `observed_data`, then (if
    /// consistent) calibrates `mapping` on the held-out set and samples
    /// `num_samples` posterior draws per observed row.
    ///
    /// # Errors
    ///
    /// Propagates errors from basis fitting, evaluation, calibration, the
    /// mapping and sampling.
    pub fn run<M: InverseMapping + ?Sized>(
        &self,
        prior_data: &Matrix<f64>,
        observed_data: &Matrix<f64>,
        heldout_data: &Matrix<f64>,
        heldout_params: &Matrix<f64>,
        mapping: &M,
        num_samples: usize,
    ) -> Result<WorkflowOutcome> {
        let (_, report) = PriorFalsification::new()
            .with_config(self.falsification)
            .fit_evaluate(prior_data, observed_data, self.n_components)?;

        if !report.is_consistent() {
            tracing::warn!(
                failing = ?report.failing_components(),
                max_margin = report.max_margin(),
                "prior falsified by observed data; skipping posterior sampling"
            );
            return Ok(WorkflowOutcome::Falsified(report));
        }

        let model = CalibrationModel::from_mapping(mapping, heldout_data, heldout_params)?;
        let mut sampler = EmpiricalPosteriorSampler::new().with_policy(self.policy);
        if let Some(seed) = self.random_state {
            sampler = sampler.with_random_state(seed);
        }
        let posteriors =
            sampler.sample_with_mapping(&model, mapping, observed_data, num_samples)?;

        Ok(WorkflowOutcome::Posterior { report, posteriors })
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;

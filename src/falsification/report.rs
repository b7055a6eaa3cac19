//! Falsification verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{ConsistencyRule, Envelope};

/// Verdict for one principal-component axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Zero-based component index
    pub component: usize,
    /// Fraction of prior variance along this axis
    pub explained_variance_ratio: f64,
    /// Lower bound of the prior envelope
    pub lower: f64,
    /// Upper bound of the prior envelope
    pub upper: f64,
    /// Smallest observed score
    pub observed_min: f64,
    /// Largest observed score
    pub observed_max: f64,
    /// Number of observed rows outside the envelope
    pub n_outside: usize,
    /// Largest distance of an observed score outside the envelope (0 if all inside)
    pub margin: f64,
    /// True when every observed score lies within the envelope
    pub within: bool,
}

/// Outcome of comparing observed data against a prior ensemble in PCA
/// score space.
///
/// Depends only on the multiset of prior and observed rows, not on their
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsificationReport {
    /// Per-component verdicts, in descending variance order
    pub components: Vec<ComponentCheck>,
    /// Overall verdict under `rule`
    pub consistent: bool,
    /// Envelope used on each axis
    pub envelope: Envelope,
    /// Rule that produced `consistent`
    pub rule: ConsistencyRule,
    /// Number of prior realizations
    pub n_prior: usize,
    /// Number of observed rows
    pub n_observed: usize,
}

impl FalsificationReport {
    /// True when the prior is not falsified by the observations.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Indices of components whose envelope excludes an observation.
    #[must_use]
    pub fn failing_components(&self) -> Vec<usize> {
        self.components
            .iter()
            .filter(|c| !c.within)
            .map(|c| c.component)
            .collect()
    }

    /// Largest margin over all components.
    #[must_use]
    pub fn max_margin(&self) -> f64 {
        self.components.iter().map(|c| c.margin).fold(0.0, f64::max)
    }
}

impl fmt::Display for FalsificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Prior falsification: {} ({} prior, {} observed, {:?}, {:?})",
            if self.consistent {
                "consistent"
            } else {
                "FALSIFIED"
            },
            self.n_prior,
            self.n_observed,
            self.envelope,
            self.rule
        )?;
        for c in &self.components {
            writeln!(
                f,
                "  PC {:>2} ({:>6.2}%)  prior [{:>10.4}, {:>10.4}]  obs [{:>10.4}, {:>10.4}]  outside {:>3}  margin {:.4}",
                c.component + 1,
                c.explained_variance_ratio * 100.0,
                c.lower,
                c.upper,
                c.observed_min,
                c.observed_max,
                c.n_outside,
                c.margin
            )?;
        }
        Ok(())
    }
}

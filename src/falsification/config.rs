//! Consistency criteria for prior falsification.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::stats::DescriptiveStats;

use super::report::ComponentCheck;

/// Region of a principal-component axis the prior is considered to cover.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Envelope {
    /// Full range of the prior scores.
    #[default]
    MinMax,
    /// Band between two percentiles (0-100) of the prior scores, R-7
    /// interpolated.
    Percentile {
        /// Lower percentile
        lower: f64,
        /// Upper percentile
        upper: f64,
    },
}

impl Envelope {
    /// Checks percentile bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` unless `0 <= lower < upper <= 100`.
    pub fn validate(&self) -> Result<()> {
        if let Envelope::Percentile { lower, upper } = *self {
            if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) || lower >= upper
            {
                return Err(UqError::invalid_hyperparameter(
                    "percentile_band",
                    format!("[{lower}, {upper}]"),
                    "0 <= lower < upper <= 100",
                ));
            }
        }
        Ok(())
    }

    /// Computes the (lower, upper) bounds of the envelope over `scores`.
    ///
    /// # Errors
    ///
    /// Returns an error if `scores` is empty.
    pub fn bounds(&self, scores: &[f64]) -> Result<(f64, f64)> {
        let stats = DescriptiveStats::new(scores);
        match *self {
            Envelope::MinMax => stats
                .min_max()
                .ok_or_else(|| UqError::empty_input("prior scores")),
            Envelope::Percentile { lower, upper } => {
                let p = stats.percentiles(&[lower, upper])?;
                Ok((p[0], p[1]))
            }
        }
    }
}

/// Which per-component verdicts decide overall consistency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ConsistencyRule {
    /// Every retained component must pass.
    #[default]
    AllComponents,
    /// The first `n` components (highest variance) must pass.
    LeadingComponents(usize),
    /// At least this fraction of components must pass.
    MinPassFraction(f64),
}

impl ConsistencyRule {
    /// Checks the rule against the number of evaluated components.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for `LeadingComponents(0)`, more
    /// leading components than the basis holds, or a fraction outside
    /// (0, 1].
    pub fn validate(&self, n_components: usize) -> Result<()> {
        match *self {
            ConsistencyRule::AllComponents => Ok(()),
            ConsistencyRule::LeadingComponents(n) => {
                if n == 0 || n > n_components {
                    Err(UqError::invalid_hyperparameter(
                        "leading_components",
                        n,
                        &format!("in [1, {n_components}]"),
                    ))
                } else {
                    Ok(())
                }
            }
            ConsistencyRule::MinPassFraction(f) => {
                if f > 0.0 && f <= 1.0 {
                    Ok(())
                } else {
                    Err(UqError::invalid_hyperparameter(
                        "min_pass_fraction",
                        f,
                        "in (0, 1]",
                    ))
                }
            }
        }
    }

    /// Applies the rule to per-component verdicts.
    #[must_use]
    pub fn is_consistent(&self, checks: &[ComponentCheck]) -> bool {
        match *self {
            ConsistencyRule::AllComponents => checks.iter().all(|c| c.within),
            ConsistencyRule::LeadingComponents(n) => checks.iter().take(n).all(|c| c.within),
            ConsistencyRule::MinPassFraction(f) => {
                if checks.is_empty() {
                    return true;
                }
                let passed = checks.iter().filter(|c| c.within).count();
                passed as f64 / checks.len() as f64 >= f
            }
        }
    }
}

/// Envelope and decision rule for `PriorFalsification`.
///
/// # Example
///
/// ```
/// use mcuq::falsification::{ConsistencyRule, Envelope, FalsificationConfig};
///
/// let config = FalsificationConfig::default()
///     .with_envelope(Envelope::Percentile { lower: 2.5, upper: 97.5 })
///     .with_rule(ConsistencyRule::LeadingComponents(2));
/// assert!(config.validate(3).is_ok());
/// assert!(config.validate(1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FalsificationConfig {
    /// Envelope drawn around the prior scores on each axis
    pub envelope: Envelope,
    /// Rule combining the per-axis verdicts
    pub rule: ConsistencyRule,
}

impl FalsificationConfig {
    /// Sets the envelope.
    #[must_use]
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Sets the consistency rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ConsistencyRule) -> Self {
        self.rule = rule;
        self
    }

    /// Validates the configuration for a basis with `n_components`
    /// components.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for any out-of-range setting.
    pub fn validate(&self, n_components: usize) -> Result<()> {
        self.envelope.validate()?;
        self.rule.validate(n_components)
    }
}

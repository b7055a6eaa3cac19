//! Principal component basis fitted on a prior ensemble.

use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::primitives::Matrix;
use crate::stats::column_means;

/// Mean vector, orthonormal principal directions and explained variances
/// of a prior ensemble.
///
/// Fitted once and never mutated; the same basis projects the prior and
/// every observed dataset so their scores are directly comparable.
///
/// Components are ordered by descending explained variance (stable with
/// respect to the eigen-solver order on ties) and each one is signed so
/// its largest-magnitude loading is positive.
///
/// # Example
///
/// ```
/// use mcuq::falsification::PcaBasis;
/// use mcuq::primitives::Matrix;
///
/// let prior = Matrix::from_vec(4, 3, vec![
///     1.0, 2.0, 3.0,
///     4.0, 5.0, 6.0,
///     7.0, 8.0, 9.0,
///     10.0, 11.0, 12.0,
/// ]).expect("valid matrix dimensions");
///
/// let basis = PcaBasis::fit(&prior, 2).expect("4 realizations support 2 components");
/// let scores = basis.project(&prior).expect("same feature width");
/// assert_eq!(scores.shape(), (4, 2));
/// assert!(basis.explained_variance_ratio()[0] > 0.99);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaBasis {
    /// Mean of each feature.
    mean: Vec<f64>,
    /// Principal components, one per row (k x D).
    components: Matrix<f64>,
    /// Variance explained by each component.
    explained_variance: Vec<f64>,
    /// Fraction of the total variance explained by each component.
    explained_variance_ratio: Vec<f64>,
}

impl PcaBasis {
    /// Fits the top `n_components` principal directions of `prior`.
    ///
    /// # Errors
    ///
    /// - `DegenerateBasis` if `n_components` is zero or exceeds the feature
    ///   count D.
    /// - `DimensionMismatch` if the ensemble has fewer than
    ///   `n_components + 1` realizations.
    /// - `NonFiniteValue` if the ensemble holds a NaN or infinity.
    pub fn fit(prior: &Matrix<f64>, n_components: usize) -> Result<Self> {
        let (n_samples, n_features) = prior.shape();

        if n_components == 0 || n_components > n_features {
            return Err(UqError::DegenerateBasis {
                requested: n_components,
                max_rank: n_features.min(n_samples.saturating_sub(1)),
            });
        }
        if n_samples < n_components + 1 {
            return Err(UqError::DimensionMismatch {
                expected: format!("at least {} prior realizations", n_components + 1),
                actual: format!("{n_samples}"),
            });
        }

        UqError::ensure_finite("prior ensemble", prior)?;

        let mean = column_means(prior);

        // Covariance matrix: Σ = (X - μ)ᵀ (X - μ) / (n - 1)
        let mut cov = DMatrix::<f64>::zeros(n_features, n_features);
        let mut centered = vec![0.0; n_features];
        for row in prior.rows() {
            for ((c, v), m) in centered.iter_mut().zip(row).zip(&mean) {
                *c = v - m;
            }
            for i in 0..n_features {
                if centered[i] == 0.0 {
                    continue;
                }
                for j in i..n_features {
                    cov[(i, j)] += centered[i] * centered[j];
                }
            }
        }
        let denom = (n_samples - 1) as f64;
        for i in 0..n_features {
            for j in i..n_features {
                let v = cov[(i, j)] / denom;
                cov[(i, j)] = v;
                cov[(j, i)] = v;
            }
        }
        let total_variance = cov.trace();

        let eigen = SymmetricEigen::new(cov);
        let eigenvalues = eigen.eigenvalues;
        let eigenvectors = eigen.eigenvectors;

        // Sort by eigenvalue (descending); sort_by is stable so ties keep
        // solver order.
        let mut indices: Vec<usize> = (0..n_features).collect();
        indices.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let mut components_data = Vec::with_capacity(n_components * n_features);
        let mut explained_variance = Vec::with_capacity(n_components);
        for &idx in indices.iter().take(n_components) {
            // Round-off can leave tiny negative eigenvalues on rank-deficient data
            explained_variance.push(eigenvalues[idx].max(0.0));

            let column: Vec<f64> = (0..n_features).map(|j| eigenvectors[(j, idx)]).collect();
            let pivot = column
                .iter()
                .copied()
                .enumerate()
                .fold((0, 0.0_f64), |(bi, bv), (i, v)| {
                    if v.abs() > bv.abs() {
                        (i, v)
                    } else {
                        (bi, bv)
                    }
                });
            let sign = if pivot.1 < 0.0 { -1.0 } else { 1.0 };
            components_data.extend(column.iter().map(|v| v * sign));
        }

        let explained_variance_ratio: Vec<f64> = explained_variance
            .iter()
            .map(|&v| {
                if total_variance > 0.0 {
                    v / total_variance
                } else {
                    0.0
                }
            })
            .collect();

        tracing::debug!(
            n_samples,
            n_features,
            n_components,
            retained = explained_variance_ratio.iter().sum::<f64>(),
            "fitted PCA basis on prior ensemble"
        );

        Ok(Self {
            mean,
            components: Matrix::from_vec(n_components, n_features, components_data)?,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Fits every feasible component, `min(N - 1, D)`.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateBasis` if the ensemble supports no component at all
    /// (fewer than two realizations or zero features).
    pub fn fit_all(prior: &Matrix<f64>) -> Result<Self> {
        let (n_samples, n_features) = prior.shape();
        let rank = n_features.min(n_samples.saturating_sub(1));
        if rank == 0 {
            return Err(UqError::DegenerateBasis {
                requested: 0,
                max_rank: 0,
            });
        }
        Self::fit(prior, rank)
    }

    /// Projects D-dimensional rows into k-dimensional score space.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the row width is not D.
    pub fn project(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (n_samples, n_features) = x.shape();
        if n_features != self.n_features() {
            return Err(UqError::dimension_mismatch(
                "features",
                self.n_features(),
                n_features,
            ));
        }

        let n_components = self.n_components();
        let mut result = Vec::with_capacity(n_samples * n_components);
        for row in x.rows() {
            for component in self.components.rows() {
                let score: f64 = row
                    .iter()
                    .zip(&self.mean)
                    .zip(component)
                    .map(|((v, m), c)| (v - m) * c)
                    .sum();
                result.push(score);
            }
        }

        Matrix::from_vec(n_samples, n_components, result).map_err(Into::into)
    }

    /// Reconstructs data from score space: mean + Σ score_i · component_i.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the score width is not k.
    pub fn reconstruct(&self, scores: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (n_samples, n_components) = scores.shape();
        if n_components != self.n_components() {
            return Err(UqError::dimension_mismatch(
                "components",
                self.n_components(),
                n_components,
            ));
        }

        let n_features = self.n_features();
        let mut result = Vec::with_capacity(n_samples * n_features);
        for row in scores.rows() {
            for j in 0..n_features {
                let mut value = self.mean[j];
                for (k, s) in row.iter().enumerate() {
                    value += s * self.components.get(k, j);
                }
                result.push(value);
            }
        }

        Matrix::from_vec(n_samples, n_features, result).map_err(Into::into)
    }

    /// Mean of each feature.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Principal components, one per row (k x D).
    #[must_use]
    pub fn components(&self) -> &Matrix<f64> {
        &self.components
    }

    /// Variance explained by each component.
    #[must_use]
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Fraction of total variance explained by each component.
    #[must_use]
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Running sum of the explained variance ratio (scree curve).
    #[must_use]
    pub fn cumulative_variance_ratio(&self) -> Vec<f64> {
        self.explained_variance_ratio
            .iter()
            .scan(0.0, |acc, &r| {
                *acc += r;
                Some(*acc)
            })
            .collect()
    }

    /// Smallest number of leading components whose cumulative variance
    /// ratio reaches `threshold`; all retained components if none does.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` unless `threshold` is in (0, 1].
    pub fn n_components_for_variance(&self, threshold: f64) -> Result<usize> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(UqError::invalid_hyperparameter(
                "variance_threshold",
                threshold,
                "in (0, 1]",
            ));
        }
        Ok(self
            .cumulative_variance_ratio()
            .iter()
            .position(|&c| c >= threshold)
            .map_or(self.n_components(), |i| i + 1))
    }

    /// Number of retained components k.
    #[must_use]
    pub fn n_components(&self) -> usize {
        self.components.n_rows()
    }

    /// Feature dimensionality D.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
#[path = "basis_tests.rs"]
mod tests;

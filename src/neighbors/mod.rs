//! Nearest-neighbor search and kernel weighting.
//!
//! Used by the posterior sampler to find held-out realizations whose
//! predicted parameters resemble an observation's predicted parameters.
//!
//! # Example
//!
//! ```
//! use mcuq::neighbors::{k_nearest, DistanceMetric};
//! use mcuq::primitives::Matrix;
//!
//! let candidates = Matrix::from_vec(4, 1, vec![0.0, 10.0, 1.0, 3.0]).expect("4x1");
//! let nearest = k_nearest(&[0.9], &candidates, 2, DistanceMetric::Euclidean).expect("k <= rows");
//! assert_eq!(nearest[0].index, 2);
//! assert_eq!(nearest[1].index, 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::primitives::Matrix;

/// Distances below this count as exact matches for inverse-distance weights.
const EXACT_MATCH_EPSILON: f64 = 1e-10;

/// Distance metric for nearest-neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance: `sqrt(sum((x_i - y_i)^2))`
    #[default]
    Euclidean,
    /// Manhattan distance: `sum(|x_i - y_i|)`
    Manhattan,
    /// Minkowski distance with parameter p
    Minkowski(f64),
}

impl DistanceMetric {
    /// Computes the distance between two equally sized vectors.
    #[must_use]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match *self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Minkowski(p) => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs().powf(p))
                .sum::<f64>()
                .powf(1.0 / p),
        }
    }

    /// Checks metric parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for a Minkowski order below 1.
    pub fn validate(&self) -> Result<()> {
        if let DistanceMetric::Minkowski(p) = *self {
            if !(p >= 1.0 && p.is_finite()) {
                return Err(UqError::invalid_hyperparameter(
                    "minkowski_p",
                    p,
                    "finite and >= 1",
                ));
            }
        }
        Ok(())
    }
}

/// How neighbors are weighted when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Weighting {
    /// Every neighbor is equally likely.
    #[default]
    Uniform,
    /// Weight proportional to `1 / distance`; exact matches take all the
    /// weight when present.
    InverseDistance,
    /// Gaussian kernel `exp(-0.5 * (d / bandwidth)^2)`.
    Gaussian {
        /// Kernel bandwidth in standardized units
        bandwidth: f64,
    },
}

impl Weighting {
    /// Checks kernel parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for a non-positive bandwidth.
    pub fn validate(&self) -> Result<()> {
        if let Weighting::Gaussian { bandwidth } = *self {
            if !(bandwidth > 0.0 && bandwidth.is_finite()) {
                return Err(UqError::invalid_hyperparameter(
                    "bandwidth",
                    bandwidth,
                    "finite and > 0",
                ));
            }
        }
        Ok(())
    }

    /// Computes resampling weights for the given neighbors.
    ///
    /// The result always has at least one positive entry for a non-empty
    /// neighborhood; when a kernel underflows everywhere it degrades to
    /// uniform weights.
    #[must_use]
    pub fn weights(&self, neighbors: &[Neighbor]) -> Vec<f64> {
        let weights: Vec<f64> = match *self {
            Weighting::Uniform => vec![1.0; neighbors.len()],
            Weighting::InverseDistance => {
                if neighbors
                    .iter()
                    .any(|n| n.distance < EXACT_MATCH_EPSILON)
                {
                    neighbors
                        .iter()
                        .map(|n| {
                            if n.distance < EXACT_MATCH_EPSILON {
                                1.0
                            } else {
                                0.0
                            }
                        })
                        .collect()
                } else {
                    neighbors.iter().map(|n| 1.0 / n.distance).collect()
                }
            }
            Weighting::Gaussian { bandwidth } => neighbors
                .iter()
                .map(|n| {
                    let u = n.distance / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .collect(),
        };

        let total: f64 = weights.iter().sum();
        if total > 0.0 && total.is_finite() {
            weights
        } else {
            vec![1.0; neighbors.len()]
        }
    }
}

/// A candidate row and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Row index into the candidate matrix
    pub index: usize,
    /// Distance to the query
    pub distance: f64,
}

/// Finds the `k` rows of `candidates` closest to `query`.
///
/// Results are sorted by distance; equal distances keep the lower row index
/// first, so the neighborhood is deterministic.
///
/// # Errors
///
/// Returns `InsufficientCalibrationData` if `k` exceeds the number of
/// candidates and `DimensionMismatch` if the query width differs.
pub fn k_nearest(
    query: &[f64],
    candidates: &Matrix<f64>,
    k: usize,
    metric: DistanceMetric,
) -> Result<Vec<Neighbor>> {
    let (n_candidates, n_features) = candidates.shape();
    if k > n_candidates {
        return Err(UqError::InsufficientCalibrationData {
            required: k,
            available: n_candidates,
        });
    }
    if query.len() != n_features {
        return Err(UqError::dimension_mismatch("features", n_features, query.len()));
    }

    let mut distances: Vec<Neighbor> = candidates
        .rows()
        .enumerate()
        .map(|(index, row)| Neighbor {
            index,
            distance: metric.distance(query, row),
        })
        .collect();

    let by_distance_then_index =
        |a: &Neighbor, b: &Neighbor| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index));

    if k < distances.len() && k > 0 {
        distances.select_nth_unstable_by(k - 1, by_distance_then_index);
    }
    distances.truncate(k);
    distances.sort_by(by_distance_then_index);
    Ok(distances)
}

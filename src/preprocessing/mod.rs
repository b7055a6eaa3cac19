//! Preprocessing transformers for parameter standardization.
//!
//! Nearest-neighbor search in predicted-parameter space must not let a
//! parameter with a large numeric scale dominate the distance, so every
//! dimension is z-scored first.
//!
//! # Example
//!
//! ```
//! use mcuq::preprocessing::StandardScaler;
//! use mcuq::primitives::Matrix;
//! use mcuq::traits::Transformer;
//!
//! // Porosity in [0, 1] next to permeability in the thousands
//! let data = Matrix::from_vec(4, 2, vec![
//!     0.1, 1000.0,
//!     0.2, 2000.0,
//!     0.3, 3000.0,
//!     0.4, 4000.0,
//! ]).expect("valid matrix dimensions");
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
//!
//! // Both columns now live on the same scale
//! assert!((scaled.get(0, 0) - scaled.get(0, 1)).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::primitives::Matrix;
use crate::stats::{column_means, column_stds};
use crate::traits::Transformer;

/// Standard deviations at or below this are treated as zero.
const STD_EPSILON: f64 = 1e-12;

/// Standardizes features by removing mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std. Columns with
/// zero variance are centered but not scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f64>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f64>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates an unfitted `StandardScaler`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Returns the mean of each feature, if fitted.
    #[must_use]
    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    /// Returns the standard deviation of each feature, if fitted.
    #[must_use]
    pub fn std(&self) -> Option<&[f64]> {
        self.std.as_deref()
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Standardizes a single row into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or the row length
    /// differs from the fitted feature count.
    pub fn transform_row(&self, row: &[f64], out: &mut Vec<f64>) -> Result<()> {
        let (mean, std) = self.fitted()?;
        if row.len() != mean.len() {
            return Err(UqError::dimension_mismatch("features", mean.len(), row.len()));
        }
        out.clear();
        out.extend(row.iter().zip(mean).zip(std).map(|((&v, &m), &s)| {
            if s > STD_EPSILON {
                (v - m) / s
            } else {
                v - m
            }
        }));
        Ok(())
    }

    fn fitted(&self) -> Result<(&[f64], &[f64])> {
        let mean = self
            .mean
            .as_deref()
            .ok_or_else(|| UqError::from("Scaler not fitted"))?;
        let std = self
            .std
            .as_deref()
            .ok_or_else(|| UqError::from("Scaler not fitted"))?;
        Ok((mean, std))
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature.
    fn fit(&mut self, x: &Matrix<f64>) -> Result<()> {
        if x.is_empty() {
            return Err(UqError::empty_input("scaler input"));
        }

        let mean = column_means(x);
        // Population std (divide by n), like sklearn
        let std = column_stds(x, &mean);

        let constant = std.iter().filter(|&&s| s <= STD_EPSILON).count();
        if constant > 0 {
            tracing::warn!(
                constant_columns = constant,
                "zero-variance columns are centered but left unscaled"
            );
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (n_samples, n_features) = x.shape();
        let mut result = Vec::with_capacity(n_samples * n_features);
        let mut buf = Vec::with_capacity(n_features);
        for row in x.rows() {
            self.transform_row(row, &mut buf)?;
            result.extend_from_slice(&buf);
        }
        if n_samples == 0 {
            let (mean, _) = self.fitted()?;
            if n_features != mean.len() {
                return Err(UqError::dimension_mismatch("features", mean.len(), n_features));
            }
        }
        Matrix::from_vec(n_samples, n_features, result).map_err(Into::into)
    }
}

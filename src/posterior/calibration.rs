//! Empirical error model of an inverse mapping on held-out prior
//! realizations.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UqError};
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::stats::DescriptiveStats;
use crate::traits::{InverseMapping, Transformer};

/// Paired (predicted, true) parameters for held-out prior realizations.
///
/// No parametric distribution is fitted: the pairs themselves are the
/// empirical joint error distribution. Standardization statistics come
/// from the held-out predictions and are reused for every query.
///
/// # Example
///
/// ```
/// use mcuq::posterior::CalibrationModel;
/// use mcuq::primitives::Matrix;
///
/// let truth = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("3x1");
/// let predicted = Matrix::from_vec(3, 1, vec![1.1, 1.8, 3.3]).expect("3x1");
/// let model = CalibrationModel::calibrate(&truth, &predicted).expect("aligned inputs");
/// assert_eq!(model.n_samples(), 3);
/// assert!((model.residuals().get(2, 0) + 0.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    truth: Matrix<f64>,
    predicted: Matrix<f64>,
    /// `predicted` after z-scoring, cached for neighbor search.
    standardized: Matrix<f64>,
    /// `truth - predicted`, row for row.
    residuals: Matrix<f64>,
    scaler: StandardScaler,
}

impl CalibrationModel {
    /// Builds the model from true parameters and the inverse mapping's
    /// predictions for the same held-out realizations (row i of both refers
    /// to the same realization).
    ///
    /// # Errors
    ///
    /// - `AlignmentError` if the two arrays differ in row or column count.
    /// - `InsufficientCalibrationData` if there are no rows.
    /// - `DimensionMismatch` if there are no parameter columns.
    /// - `NonFiniteValue` if either array holds a NaN or infinity.
    pub fn calibrate(true_params: &Matrix<f64>, predicted_params: &Matrix<f64>) -> Result<Self> {
        if true_params.shape() != predicted_params.shape() {
            return Err(UqError::AlignmentError {
                truth: true_params.shape(),
                predicted: predicted_params.shape(),
            });
        }
        let (n_samples, n_params) = true_params.shape();
        if n_samples == 0 {
            return Err(UqError::InsufficientCalibrationData {
                required: 1,
                available: 0,
            });
        }
        if n_params == 0 {
            return Err(UqError::DimensionMismatch {
                expected: "at least one parameter".to_string(),
                actual: "0 columns".to_string(),
            });
        }

        UqError::ensure_finite("true parameters", true_params)?;
        UqError::ensure_finite("predicted parameters", predicted_params)?;

        let mut scaler = StandardScaler::new();
        let standardized = scaler.fit_transform(predicted_params)?;
        let residuals = true_params.sub(predicted_params)?;

        tracing::debug!(n_samples, n_params, "calibrated empirical error model");

        Ok(Self {
            truth: true_params.clone(),
            predicted: predicted_params.clone(),
            standardized,
            residuals,
            scaler,
        })
    }

    /// Runs `mapping` over held-out data and calibrates against the known
    /// true parameters.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the mapping does not return one row
    /// per input row, and any error from the mapping or `calibrate`.
    pub fn from_mapping<M: InverseMapping + ?Sized>(
        mapping: &M,
        heldout_data: &Matrix<f64>,
        heldout_true: &Matrix<f64>,
    ) -> Result<Self> {
        let predicted = mapping.predict(heldout_data)?;
        if predicted.n_rows() != heldout_data.n_rows() {
            return Err(UqError::dimension_mismatch(
                "mapping output rows",
                heldout_data.n_rows(),
                predicted.n_rows(),
            ));
        }
        Self::calibrate(heldout_true, &predicted)
    }

    /// Z-scores parameter rows with the held-out prediction statistics.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the width is not P and
    /// `NonFiniteValue` for a NaN or infinite entry.
    pub fn standardize(&self, params: &Matrix<f64>) -> Result<Matrix<f64>> {
        if params.n_cols() != self.n_params() {
            return Err(UqError::dimension_mismatch(
                "parameters",
                self.n_params(),
                params.n_cols(),
            ));
        }
        UqError::ensure_finite("observed predictions", params)?;
        self.scaler.transform(params)
    }

    /// Per-parameter population std of the residuals of the given rows.
    #[must_use]
    pub fn residual_std(&self, rows: &[usize]) -> Vec<f64> {
        (0..self.n_params())
            .map(|p| {
                let values: Vec<f64> = rows.iter().map(|&i| self.residuals.get(i, p)).collect();
                DescriptiveStats::new(&values).std().unwrap_or(0.0)
            })
            .collect()
    }

    /// True parameters of the held-out realizations.
    #[must_use]
    pub fn truth(&self) -> &Matrix<f64> {
        &self.truth
    }

    /// Inverse-mapping predictions for the held-out realizations.
    #[must_use]
    pub fn predicted(&self) -> &Matrix<f64> {
        &self.predicted
    }

    /// Standardized held-out predictions.
    #[must_use]
    pub fn standardized_predictions(&self) -> &Matrix<f64> {
        &self.standardized
    }

    /// Residuals `truth - predicted`.
    #[must_use]
    pub fn residuals(&self) -> &Matrix<f64> {
        &self.residuals
    }

    /// Scaler fitted on the held-out predictions.
    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Number of held-out realizations N.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.truth.n_rows()
    }

    /// Parameter dimensionality P.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.truth.n_cols()
    }
}

//! Error types for uncertainty-quantification operations.
//!
//! Every precondition violation is reported synchronously by the call that
//! detects it. None of these are transient, so nothing is retried.

use std::fmt;

use crate::primitives::Matrix;

/// Main error type for `mcuq` operations.
///
/// # Examples
///
/// ```
/// use mcuq::error::UqError;
///
/// let err = UqError::DimensionMismatch {
///     expected: "features=5".to_string(),
///     actual: "4".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum UqError {
    /// Vector length inconsistent with the expected D or P.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Paired true/predicted arrays do not line up row for row.
    AlignmentError {
        /// Shape of the true parameter array (rows, cols)
        truth: (usize, usize),
        /// Shape of the predicted parameter array (rows, cols)
        predicted: (usize, usize),
    },

    /// Fewer held-out realizations than the sampler needs.
    InsufficientCalibrationData {
        /// Number of rows the operation needs
        required: usize,
        /// Number of calibration rows available
        available: usize,
    },

    /// Requested principal-component count exceeds the feasible rank.
    DegenerateBasis {
        /// Requested number of components
        requested: usize,
        /// Largest feasible number of components
        max_rank: usize,
    },

    /// NaN or infinite entry in numeric input.
    NonFiniteValue {
        /// Which input held the value
        context: String,
        /// Row of the first offending entry
        row: usize,
        /// Column of the first offending entry
        col: usize,
    },

    /// Invalid configuration value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for UqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UqError::DimensionMismatch { expected, actual } => {
                write!(f, "Vector dimension mismatch: expected {expected}, got {actual}")
            }
            UqError::AlignmentError { truth, predicted } => {
                write!(
                    f,
                    "Alignment error: true parameters are {}x{} but predicted parameters are {}x{}",
                    truth.0, truth.1, predicted.0, predicted.1
                )
            }
            UqError::InsufficientCalibrationData {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient calibration data: need {required} held-out realizations, have {available}"
                )
            }
            UqError::DegenerateBasis {
                requested,
                max_rank,
            } => {
                write!(
                    f,
                    "Degenerate basis: requested {requested} components, feasible rank is {max_rank}"
                )
            }
            UqError::NonFiniteValue { context, row, col } => {
                write!(f, "Non-finite value in {context} at row {row}, column {col}")
            }
            UqError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            UqError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for UqError {}

impl From<&str> for UqError {
    fn from(msg: &str) -> Self {
        UqError::Other(msg.to_string())
    }
}

impl From<String> for UqError {
    fn from(msg: String) -> Self {
        UqError::Other(msg)
    }
}

impl UqError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::DimensionMismatch {
            expected: format!("non-empty {context}"),
            actual: "0 rows".to_string(),
        }
    }

    /// Fails with `NonFiniteValue` at the first NaN or infinite entry of `x`.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` naming `context` and the entry position.
    pub fn ensure_finite(context: &str, x: &Matrix<f64>) -> Result<()> {
        match x.first_non_finite() {
            Some((row, col)) => Err(Self::NonFiniteValue {
                context: context.to_string(),
                row,
                col,
            }),
            None => Ok(()),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, UqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = UqError::DimensionMismatch {
            expected: "features=5".to_string(),
            actual: "3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dimension mismatch"));
        assert!(msg.contains("features=5"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_alignment_error_display() {
        let err = UqError::AlignmentError {
            truth: (50, 2),
            predicted: (49, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("Alignment"));
        assert!(msg.contains("50x2"));
        assert!(msg.contains("49x2"));
    }

    #[test]
    fn test_insufficient_calibration_display() {
        let err = UqError::InsufficientCalibrationData {
            required: 10,
            available: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("need 10"));
        assert!(msg.contains("have 4"));
    }

    #[test]
    fn test_degenerate_basis_display() {
        let err = UqError::DegenerateBasis {
            requested: 7,
            max_rank: 5,
        };
        assert!(err.to_string().contains("requested 7"));
        assert!(err.to_string().contains("rank is 5"));
    }

    #[test]
    fn test_invalid_hyperparameter_helper() {
        let err = UqError::invalid_hyperparameter("k", 0, ">= 1");
        assert_eq!(
            err.to_string(),
            "Invalid hyperparameter: k = 0, expected >= 1"
        );
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = UqError::dimension_mismatch("params", 2, 3);
        let msg = err.to_string();
        assert!(msg.contains("params=2"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_empty_input_helper() {
        let err = UqError::empty_input("observed data");
        assert!(matches!(err, UqError::DimensionMismatch { .. }));
        assert!(err.to_string().contains("observed data"));
    }

    #[test]
    fn test_ensure_finite_reports_first_offender() {
        let x = Matrix::from_vec(2, 2, vec![0.0, 1.0, f64::NAN, f64::INFINITY]).expect("2x2");
        let err = UqError::ensure_finite("prior ensemble", &x).unwrap_err();
        assert_eq!(
            err,
            UqError::NonFiniteValue {
                context: "prior ensemble".to_string(),
                row: 1,
                col: 0
            }
        );
        assert!(err.to_string().contains("row 1, column 0"));
        assert!(UqError::ensure_finite("ok", &Matrix::zeros(2, 2)).is_ok());
    }

    #[test]
    fn test_from_str_and_string() {
        let a: UqError = "boom".into();
        let b: UqError = "boom".to_string().into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "boom");
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UqError>();
    }
}

//! Core traits at the seams between the statistical core and its callers.

use crate::error::Result;
use crate::primitives::Matrix;

/// Trait for data transformers (scalers).
///
/// # Examples
///
/// ```
/// use mcuq::preprocessing::StandardScaler;
/// use mcuq::primitives::Matrix;
/// use mcuq::traits::Transformer;
///
/// let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("3x1");
/// let mut scaler = StandardScaler::new();
/// let z = scaler.fit_transform(&x).expect("fit_transform should succeed");
/// assert!(z.get(1, 0).abs() < 1e-12);
/// ```
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f64>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if transformer is not fitted.
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// A black-box inverse model: a batch of D-dim data vectors in, a batch of
/// P-dim parameter vectors out.
///
/// The core only invokes the mapping; it never trains or mutates it. Any
/// closure of the right shape is an `InverseMapping`.
///
/// # Examples
///
/// ```
/// use mcuq::primitives::Matrix;
/// use mcuq::traits::InverseMapping;
///
/// // Predict a single parameter as the row mean.
/// let mapping = |x: &Matrix<f64>| -> mcuq::Result<Matrix<f64>> {
///     let means: Vec<f64> = x.rows().map(|r| r.iter().sum::<f64>() / r.len() as f64).collect();
///     Ok(Matrix::from_vec(means.len(), 1, means)?)
/// };
///
/// let data = Matrix::from_vec(2, 2, vec![1.0, 3.0, 2.0, 4.0]).expect("2x2");
/// let params = mapping.predict(&data).expect("mapping succeeds");
/// assert_eq!(params.as_slice(), &[2.0, 3.0]);
/// ```
pub trait InverseMapping {
    /// Maps each data row to a parameter row.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying model reports.
    fn predict(&self, data: &Matrix<f64>) -> Result<Matrix<f64>>;
}

impl<F> InverseMapping for F
where
    F: Fn(&Matrix<f64>) -> Result<Matrix<f64>>,
{
    fn predict(&self, data: &Matrix<f64>) -> Result<Matrix<f64>> {
        self(data)
    }
}

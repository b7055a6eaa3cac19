//! Descriptive statistics shared by falsification and posterior sampling.
//!
//! - Quantiles and percentiles using the R-7 method (Hyndman & Fan 1996),
//!   the same convention as R, `NumPy` and Pandas.
//! - Column-wise mean, population standard deviation and range for
//!   ensemble matrices.
//!
//! # Examples
//!
//! ```
//! use mcuq::stats::DescriptiveStats;
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(&data);
//!
//! assert_eq!(stats.quantile(0.5).expect("median of non-empty data"), 3.0);
//! assert_eq!(stats.quantile(0.0).expect("min of non-empty data"), 1.0);
//! assert_eq!(stats.quantile(1.0).expect("max of non-empty data"), 5.0);
//! ```

use crate::error::{Result, UqError};
use crate::primitives::Matrix;

/// Descriptive statistics computed on a slice of f64 values.
///
/// Holds a reference to the data to avoid unnecessary copying.
#[derive(Debug, Clone, Copy)]
pub struct DescriptiveStats<'a> {
    data: &'a [f64],
}

impl<'a> DescriptiveStats<'a> {
    /// Create a new `DescriptiveStats` view over `data`.
    #[must_use]
    pub fn new(data: &'a [f64]) -> Self {
        Self { data }
    }

    /// Arithmetic mean, `None` for empty data.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().sum::<f64>() / self.data.len() as f64)
    }

    /// Population standard deviation (divide by n), `None` for empty data.
    #[must_use]
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sum_sq: f64 = self.data.iter().map(|x| (x - mean) * (x - mean)).sum();
        Some((sum_sq / self.data.len() as f64).sqrt())
    }

    /// Minimum and maximum, `None` for empty data.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        if self.data.is_empty() {
            return None;
        }
        Some(
            self.data
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                }),
        )
    }

    /// Compute quantile using linear interpolation (R-7 method).
    ///
    /// Uses `select_nth_unstable_by` for O(n) average-case selection
    /// instead of a full sort.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or `q` is not in [0, 1].
    pub fn quantile(&self, q: f64) -> Result<f64> {
        if self.data.is_empty() {
            return Err(UqError::empty_input("quantile data"));
        }
        if !(0.0..=1.0).contains(&q) {
            return Err(UqError::invalid_hyperparameter("quantile", q, "in [0, 1]"));
        }

        let n = self.data.len();
        if n == 1 {
            return Ok(self.data[0]);
        }

        // R-7: h = (n - 1) * q, 0-indexed position in sorted order
        let h = (n - 1) as f64 * q;
        let h_floor = h.floor() as usize;
        let h_ceil = h.ceil() as usize;

        let mut working_copy = self.data.to_vec();
        working_copy.select_nth_unstable_by(h_floor, f64::total_cmp);
        let lower = working_copy[h_floor];
        if h_floor == h_ceil {
            return Ok(lower);
        }

        // Everything above h_floor is in the upper partition, so the next
        // order statistic is its minimum.
        let upper = working_copy[h_floor + 1..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        Ok(lower + (h - h_floor as f64) * (upper - lower))
    }

    /// Compute multiple percentiles with a single sort.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or any percentile is outside
    /// [0, 100].
    ///
    /// # Examples
    ///
    /// ```
    /// use mcuq::stats::DescriptiveStats;
    ///
    /// let data = [1.0, 2.0, 3.0, 4.0, 5.0];
    /// let p = DescriptiveStats::new(&data).percentiles(&[25.0, 50.0, 75.0]).expect("valid percentiles");
    /// assert_eq!(p, vec![2.0, 3.0, 4.0]);
    /// ```
    pub fn percentiles(&self, percentiles: &[f64]) -> Result<Vec<f64>> {
        if self.data.is_empty() {
            return Err(UqError::empty_input("percentile data"));
        }
        for &p in percentiles {
            if !(0.0..=100.0).contains(&p) {
                return Err(UqError::invalid_hyperparameter(
                    "percentile",
                    p,
                    "in [0, 100]",
                ));
            }
        }

        let mut sorted = self.data.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        Ok(percentiles
            .iter()
            .map(|&p| {
                let h = (n - 1) as f64 * (p / 100.0);
                let h_floor = h.floor() as usize;
                let h_ceil = h.ceil() as usize;
                if h_floor == h_ceil {
                    sorted[h_floor]
                } else {
                    let fraction = h - h_floor as f64;
                    sorted[h_floor] + fraction * (sorted[h_ceil] - sorted[h_floor])
                }
            })
            .collect())
    }
}

/// Mean of each column.
#[must_use]
pub fn column_means(x: &Matrix<f64>) -> Vec<f64> {
    let (n_samples, n_features) = x.shape();
    let mut mean = vec![0.0; n_features];
    if n_samples == 0 {
        return mean;
    }
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= n_samples as f64;
    }
    mean
}

/// Population standard deviation of each column around `means`.
#[must_use]
pub fn column_stds(x: &Matrix<f64>, means: &[f64]) -> Vec<f64> {
    let (n_samples, n_features) = x.shape();
    let mut std = vec![0.0; n_features];
    if n_samples == 0 {
        return std;
    }
    for row in x.rows() {
        for ((s, v), m) in std.iter_mut().zip(row).zip(means) {
            let diff = v - m;
            *s += diff * diff;
        }
    }
    for s in &mut std {
        *s = (*s / n_samples as f64).sqrt();
    }
    std
}

/// Minimum and maximum of each column. Empty input yields infinite bounds.
#[must_use]
pub fn column_ranges(x: &Matrix<f64>) -> Vec<(f64, f64)> {
    let mut ranges = vec![(f64::INFINITY, f64::NEG_INFINITY); x.n_cols()];
    for row in x.rows() {
        for ((lo, hi), &v) in ranges.iter_mut().zip(row) {
            *lo = lo.min(v);
            *hi = hi.max(v);
        }
    }
    ranges
}

#[cfg(test)]
#[path = "descriptive_tests.rs"]
mod tests;

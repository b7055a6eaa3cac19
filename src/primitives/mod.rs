//! Core compute primitives.
//!
//! Ensembles, observed data and parameter sets are all stored as
//! row-major matrices with one realization per row.

mod matrix;

pub use matrix::Matrix;

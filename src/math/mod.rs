//! Mathematical utilities: closed-form single-regressor least squares.

pub mod ols;

pub use ols::*;

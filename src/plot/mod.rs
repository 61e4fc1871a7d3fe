//! Chart output.

pub mod charts;

pub use charts::*;

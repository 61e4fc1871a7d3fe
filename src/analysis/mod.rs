//! Aggregations over an in-memory dataset.
//!
//! Nothing in here performs I/O; every function takes `&[SaleRecord]` and
//! returns plain values or an [`AnalysisError`](crate::error::AnalysisError).

pub mod group;
pub mod kpi;

pub use group::*;
pub use kpi::*;

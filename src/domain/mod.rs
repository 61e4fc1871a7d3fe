//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the input record (`SaleRecord`)
//! - monthly series and forecast outputs (`MonthlyAggregate`, `ForecastModel`, `Forecast`)
//! - the persisted forecast file (`ForecastFile`)

pub mod types;

pub use types::*;

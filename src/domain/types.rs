//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation and forecasting
//! - written to CSV (the dataset) and JSON (the forecast file)
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One order line of the sales dataset.
///
/// Field names on the wire match the fixed spreadsheet columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(rename = "Order_ID")]
    pub order_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Unit_Price")]
    pub unit_price: f64,
    /// Always `unit_price * quantity`.
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    /// Never exceeds `revenue`.
    #[serde(rename = "Profit")]
    pub profit: f64,
}

/// A calendar month (year + month number), ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Full month name, e.g. `"March"`.
    pub fn month_name(self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Total revenue of one observed month.
///
/// `month_index` is the 1-based position among the months present in the
/// data, not the calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month_index: usize,
    pub year_month: YearMonth,
    pub total_revenue: f64,
}

/// Least-squares line `revenue ≈ slope * month_index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub slope: f64,
    pub intercept: f64,
}

impl ForecastModel {
    pub fn predict(&self, month_index: f64) -> f64 {
        self.slope * month_index + self.intercept
    }
}

/// One extrapolated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month_index: usize,
    /// Month label, e.g. `"December 2024"`.
    pub label: String,
    pub revenue: f64,
}

/// Everything the forecaster computes for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub months: Vec<MonthlyAggregate>,
    pub model: ForecastModel,
    /// Coefficient of determination in `[.., 1]`.
    pub r_squared: f64,
    /// In-sample predictions, aligned with `months`.
    pub fitted: Vec<f64>,
    pub points: Vec<ForecastPoint>,
    pub forecast_total: f64,
    /// Revenue of the (up to) three most recent observed months.
    pub trailing_total: f64,
    pub growth_pct: f64,
}

impl Forecast {
    pub fn accuracy_pct(&self) -> f64 {
        self.r_squared * 100.0
    }
}

/// Next-month prediction for one region, or why it could not be made.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionForecast {
    pub region: String,
    pub months: usize,
    pub outcome: Result<f64, AnalysisError>,
}

/// A saved forecast file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub source: String,
    pub last_order_date: NaiveDate,
    pub months: Vec<MonthlyAggregate>,
    pub model: ForecastModel,
    pub r_squared: f64,
    pub forecast: Vec<ForecastPoint>,
    pub forecast_total: f64,
    pub growth_pct: f64,
}

/// Paths resolved from flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
}

//! Shared "load -> aggregate -> forecast" logic used by both CLI and TUI
//! front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow; the CLI and
//! the TUI can then focus on presentation (printing vs widgets).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::analysis::{Group, Kpis, by_quarter, by_weekday, compute_kpis, product_profitability};
use crate::domain::{Forecast, RegionForecast, SaleRecord};
use crate::error::{AnalysisError, AppError};
use crate::forecast::{forecast_by_region, forecast_revenue};
use crate::io::ingest::{IngestedData, load_sales};

/// Outputs of a `sales forecast` run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub forecast: Forecast,
    pub regional: Vec<RegionForecast>,
    pub last_order_date: NaiveDate,
}

/// Load the dataset and print how many rows were usable.
///
/// Skipped rows are logged individually by the loader; the count goes to
/// stderr so stdout stays a clean report.
pub fn load_dataset(path: &Path) -> Result<IngestedData, AppError> {
    let data = load_sales(path)?;
    if !data.row_errors.is_empty() {
        eprintln!(
            "Skipped {} of {} rows in '{}' (run with RUST_LOG=warn for details).",
            data.row_errors.len(),
            data.rows_read,
            path.display()
        );
    }
    Ok(data)
}

fn last_order_date(records: &[SaleRecord]) -> Result<NaiveDate, AnalysisError> {
    records
        .iter()
        .map(|r| r.date)
        .max()
        .ok_or_else(|| AnalysisError::empty("forecast"))
}

/// Fit the overall forecast and the independent per-region forecasts.
pub fn run_forecast(records: &[SaleRecord]) -> Result<ForecastRun, AppError> {
    let forecast = forecast_revenue(records)?;
    let regional = forecast_by_region(records);
    Ok(ForecastRun {
        forecast,
        regional,
        last_order_date: last_order_date(records)?,
    })
}

/// Everything the terminal dashboard shows for one load of the dataset.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub source: PathBuf,
    pub rows_used: usize,
    pub rows_skipped: usize,
    pub kpis: Kpis,
    /// A dataset spanning a single month still renders; the trend panel shows
    /// the error instead.
    pub forecast: Result<Forecast, AnalysisError>,
    pub quarters: Vec<Group<u32>>,
    /// Day of week (0 = Monday) and mean revenue per order.
    pub weekday_means: Vec<(u32, f64)>,
    /// Products by profit, with margin %.
    pub product_margins: Vec<(Group<String>, f64)>,
}

/// Load and aggregate the dataset for the dashboard.
pub fn load_dashboard(path: &Path) -> Result<DashboardData, AppError> {
    let data = load_sales(path)?;
    let records = &data.records;

    let kpis = compute_kpis(records)?;
    let weekday_means = by_weekday(records)
        .iter()
        .map(|g| Ok((g.key, g.totals.mean_revenue("weekday mean revenue")?)))
        .collect::<Result<Vec<_>, AnalysisError>>()?;
    let product_margins = product_profitability(records)
        .into_iter()
        .map(|g| {
            let margin = g.totals.margin_pct("product profit margin")?;
            Ok((g, margin))
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    Ok(DashboardData {
        source: path.to_path_buf(),
        rows_used: data.rows_used,
        rows_skipped: data.row_errors.len(),
        kpis,
        forecast: forecast_revenue(records),
        quarters: by_quarter(records),
        weekday_means,
        product_margins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::sample;
    use crate::io::export::write_sales_csv;

    #[test]
    fn forecast_run_covers_every_region() {
        let records = sample();
        let run = run_forecast(&records).unwrap();
        assert_eq!(run.forecast.points.len(), 3);
        assert_eq!(run.regional.len(), 4);
        assert!(run.regional.iter().all(|r| r.outcome.is_ok()));
        assert_eq!(run.last_order_date, records.iter().map(|r| r.date).max().unwrap());
    }

    #[test]
    fn dashboard_loads_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_sales_csv(&path, &sample()).unwrap();

        let data = load_dashboard(&path).unwrap();
        assert_eq!(data.rows_used, 500);
        assert_eq!(data.rows_skipped, 0);
        assert!(data.forecast.is_ok());
        assert!(!data.quarters.is_empty());
        assert!(data.weekday_means.len() <= 7);
        assert_eq!(data.product_margins.len(), 8);
    }

    #[test]
    fn missing_dataset_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dashboard(&dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

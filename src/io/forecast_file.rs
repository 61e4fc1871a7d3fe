//! Read/write forecast JSON files.
//!
//! A forecast file is the portable representation of one forecast run:
//! - the observed monthly series
//! - the fitted line and its R²
//! - the extrapolated months, their total and the projected growth
//!
//! The schema is defined by `domain::ForecastFile`. `sales plot` re-renders a
//! chart from it without the source dataset.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{Forecast, ForecastFile};
use crate::error::AppError;

pub fn to_forecast_file(forecast: &Forecast, source: &Path, last_order_date: NaiveDate) -> ForecastFile {
    ForecastFile {
        tool: "sales".to_string(),
        source: source.display().to_string(),
        last_order_date,
        months: forecast.months.clone(),
        model: forecast.model,
        r_squared: forecast.r_squared,
        forecast: forecast.points.clone(),
        forecast_total: forecast.forecast_total,
        growth_pct: forecast.growth_pct,
    }
}

/// Write a forecast JSON file.
pub fn write_forecast_json(path: &Path, file: &ForecastFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create forecast JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write forecast JSON: {e}")))?;

    info!(path = %path.display(), "wrote forecast file");
    Ok(())
}

/// Read a forecast JSON file.
pub fn read_forecast_json(path: &Path) -> Result<ForecastFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open forecast JSON '{}': {e}", path.display())))?;
    let forecast: ForecastFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid forecast JSON: {e}")))?;

    if forecast.months.is_empty() {
        return Err(AppError::new(2, "Forecast JSON has no observed months."));
    }
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sales};
    use crate::forecast::forecast_revenue;

    #[test]
    fn forecast_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.json");
        let records = generate_sales(&SampleConfig::default()).unwrap();
        let forecast = forecast_revenue(&records).unwrap();
        let last = records.iter().map(|r| r.date).max().unwrap();

        let file = to_forecast_file(&forecast, Path::new("sales_data.csv"), last);
        write_forecast_json(&path, &file).unwrap();
        let back = read_forecast_json(&path).unwrap();

        assert_eq!(back.tool, "sales");
        assert_eq!(back.months, forecast.months);
        assert_eq!(back.forecast, forecast.points);
        assert_eq!(back.model, forecast.model);
        assert_eq!(back.last_order_date, last);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"tool\": \"sales\"}").unwrap();
        assert_eq!(read_forecast_json(&path).unwrap_err().exit_code(), 2);
    }
}

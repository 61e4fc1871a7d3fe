//! CSV writers: the generated dataset and the per-month forecast table.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use tracing::info;

use crate::domain::{Forecast, SaleRecord};
use crate::error::AppError;

/// Write sales records with the fixed column names.
pub fn write_sales_csv(path: &Path, records: &[SaleRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sales CSV '{}': {e}", path.display())))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::new(2, format!("Failed to write sales CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sales CSV: {e}")))?;

    info!(path = %path.display(), rows = records.len(), "wrote sales data");
    Ok(())
}

/// Write observed months (with fitted values and residuals) followed by the
/// forecast months.
pub fn write_forecast_csv(path: &Path, forecast: &Forecast) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create forecast CSV '{}': {e}", path.display())))?;
    let row_err = |e: csv::Error| AppError::new(2, format!("Failed to write forecast CSV row: {e}"));

    writer
        .write_record(["kind", "month_index", "month", "revenue", "fitted", "residual"])
        .map_err(row_err)?;

    for (m, fitted) in forecast.months.iter().zip(&forecast.fitted) {
        writer
            .write_record([
                "actual".to_string(),
                m.month_index.to_string(),
                m.year_month.to_string(),
                format!("{:.2}", m.total_revenue),
                format!("{fitted:.2}"),
                format!("{:.2}", m.total_revenue - fitted),
            ])
            .map_err(row_err)?;
    }
    for p in &forecast.points {
        writer
            .write_record([
                "forecast".to_string(),
                p.month_index.to_string(),
                p.label.clone(),
                String::new(),
                format!("{:.2}", p.revenue),
                String::new(),
            ])
            .map_err(row_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush forecast CSV: {e}")))?;

    info!(path = %path.display(), "wrote forecast table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sales};
    use crate::io::ingest::load_sales;

    #[test]
    fn written_dataset_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let records = generate_sales(&SampleConfig { count: 40, ..SampleConfig::default() }).unwrap();

        write_sales_csv(&path, &records).unwrap();
        let data = load_sales(&path).unwrap();

        assert!(data.row_errors.is_empty());
        assert_eq!(data.records, records);
    }

    #[test]
    fn forecast_table_has_actual_and_forecast_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let records = generate_sales(&SampleConfig::default()).unwrap();
        let forecast = crate::forecast::forecast_revenue(&records).unwrap();

        write_forecast_csv(&path, &forecast).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "kind,month_index,month,revenue,fitted,residual");
        assert_eq!(lines.len(), 1 + forecast.months.len() + 3);
        assert!(lines[1].starts_with("actual,1,2024-01,"));
        assert!(lines.last().unwrap().starts_with("forecast,"));
    }
}

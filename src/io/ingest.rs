//! CSV ingest and validation.
//!
//! This module turns a sales export into a clean `Vec<SaleRecord>`.
//!
//! Design goals:
//! - **Strict schema** for the fixed columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::SaleRecord;
use crate::error::AppError;

/// Required columns (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "order_id",
    "date",
    "product",
    "region",
    "quantity",
    "unit_price",
    "revenue",
    "profit",
];

/// Revenue may differ from `unit_price * quantity` by at most one cent
/// (spreadsheet rounding).
const REVENUE_TOLERANCE: f64 = 0.01;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: validated records + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<SaleRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load and validate a sales CSV file.
pub fn load_sales(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sales data '{}': {e}", path.display())))?;

    let data = read_sales(file)?;
    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used,
        "loaded sales data"
    );
    Ok(data)
}

/// Read and validate sales rows from any CSV source.
pub fn read_sales<R: Read>(source: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header line, and 1-based line numbers.
        let line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&row, &header_map) {
            Ok(record) => match validate(&record) {
                Ok(()) => records.push(record),
                Err(message) => row_errors.push(RowError {
                    line,
                    id: Some(record.order_id),
                    message,
                }),
            },
            Err(message) => row_errors.push(RowError {
                line,
                id: get_optional(&row, &header_map, "order_id").map(str::to_string),
                message,
            }),
        }
    }

    for e in &row_errors {
        warn!(line = e.line, id = e.id.as_deref().unwrap_or("-"), "skipped row: {}", e.message);
    }

    let rows_used = records.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after validation."));
    }

    Ok(IngestedData {
        records,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel emits UTF-8 CSVs with a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::new(
        2,
        format!("Missing required column(s): {}", missing.join(", ")),
    ))
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SaleRecord, String> {
    let order_id = get_required(record, header_map, "order_id")?.to_string();
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let product = get_required(record, header_map, "product")?.to_string();
    let region = get_required(record, header_map, "region")?.to_string();

    let quantity_raw = get_required(record, header_map, "quantity")?;
    let quantity = parse_quantity(quantity_raw)?;

    let unit_price = parse_f64(get_required(record, header_map, "unit_price")?, "unit_price")?;
    let revenue = parse_f64(get_required(record, header_map, "revenue")?, "revenue")?;
    let profit = parse_f64(get_required(record, header_map, "profit")?, "profit")?;

    Ok(SaleRecord {
        order_id,
        date,
        product,
        region,
        quantity,
        unit_price,
        revenue,
        profit,
    })
}

fn validate(record: &SaleRecord) -> Result<(), String> {
    if record.quantity < 1 {
        return Err("Invalid `quantity` (must be >= 1).".to_string());
    }
    if record.unit_price < 0.0 {
        return Err("Invalid `unit_price` (must be >= 0).".to_string());
    }
    let expected = record.unit_price * f64::from(record.quantity);
    if (record.revenue - expected).abs() > REVENUE_TOLERANCE {
        return Err(format!(
            "`revenue` {:.2} does not match unit_price x quantity = {expected:.2}.",
            record.revenue
        ));
    }
    if record.profit > record.revenue {
        return Err("`profit` exceeds `revenue`.".to_string());
    }
    Ok(())
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Spreadsheet exports carry either a bare date or a midnight timestamp.
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, DD/MM/YYYY, YYYY/MM/DD."
    ))
}

fn parse_quantity(s: &str) -> Result<u32, String> {
    // Integers sometimes round-trip through spreadsheets as `3.0`.
    if let Ok(q) = s.parse::<u32>() {
        return Ok(q);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
        _ => Err(format!("Invalid `quantity` '{s}' (must be a whole number).")),
    }
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` '{s}'.")),
    }
}

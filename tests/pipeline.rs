//! End-to-end: generate -> CSV -> load -> analyse/forecast/report -> files.

use std::path::Path;

use chrono::NaiveDate;
use sales_insights::analysis::{by_region, compute_kpis};
use sales_insights::app::pipeline::{load_dataset, run_forecast};
use sales_insights::data::{SampleConfig, generate_sales};
use sales_insights::io::{read_forecast_json, to_forecast_file, write_forecast_json, write_sales_csv};
use sales_insights::plot::{FORECAST_FILE, render_advanced_dashboard, render_forecast_chart, render_standard_charts};
use sales_insights::report::{build_executive_summary, format_analysis, format_forecast, write_report};

#[test]
fn generated_dataset_survives_the_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("sales_data.csv");

    let generated = generate_sales(&SampleConfig::default()).unwrap();
    write_sales_csv(&csv_path, &generated).unwrap();

    let data = load_dataset(&csv_path).unwrap();
    assert_eq!(data.rows_used, generated.len());
    assert!(data.row_errors.is_empty());
    let records = data.records;

    let kpis = compute_kpis(&records).unwrap();
    let region_sum: f64 = by_region(&records).iter().map(|g| g.totals.revenue).sum();
    approx::assert_relative_eq!(region_sum, kpis.total_revenue, max_relative = 1e-9);
    assert!(kpis.total_profit <= kpis.total_revenue);

    let analysis = format_analysis(&records).unwrap();
    assert!(
        analysis
            .lines()
            .any(|l| l.starts_with("Total Orders:") && l.trim_end().ends_with(" 500"))
    );

    let run = run_forecast(&records).unwrap();
    let forecast_text = format_forecast(&run.forecast, &run.regional);
    for region in ["North", "South", "East", "West"] {
        assert!(forecast_text.contains(region));
    }

    let generated_at = NaiveDate::from_ymd_opt(2024, 11, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let report = build_executive_summary(&records, generated_at, "sales_data.csv").unwrap();
    let report_path = dir.path().join("EXECUTIVE_SUMMARY.txt");
    write_report(&report_path, &report).unwrap();
    assert_eq!(std::fs::read_to_string(&report_path).unwrap(), report);

    let charts = dir.path().join("charts");
    std::fs::create_dir_all(&charts).unwrap();
    for path in render_standard_charts(&charts, &records).unwrap() {
        assert_svg(&path);
    }
    assert_svg(&render_advanced_dashboard(&charts, &records).unwrap());
}

#[test]
fn saved_forecast_replots_without_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let records = generate_sales(&SampleConfig {
        count: 200,
        seed: 7,
        ..SampleConfig::default()
    })
    .unwrap();
    let run = run_forecast(&records).unwrap();

    let json = dir.path().join("forecast.json");
    let file = to_forecast_file(&run.forecast, Path::new("sales_data.csv"), run.last_order_date);
    write_forecast_json(&json, &file).unwrap();

    let back = read_forecast_json(&json).unwrap();
    assert_eq!(back.forecast, run.forecast.points);

    let svg = dir.path().join(FORECAST_FILE);
    render_forecast_chart(&svg, &back.months, &back.model, &back.forecast, back.r_squared).unwrap();
    assert_svg(&svg);
}

#[test]
fn csv_with_only_invalid_rows_exits_with_no_usable_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(
        &path,
        "Order_ID,Date,Product,Region,Quantity,Unit_Price,Revenue,Profit\n\
         ORD-1,2024-01-03,Laptop,North,0,899.99,0,0\n",
    )
    .unwrap();
    assert_eq!(load_dataset(&path).unwrap_err().exit_code(), 3);
}

fn assert_svg(path: &Path) {
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("<svg"), "not an SVG: {}", path.display());
}

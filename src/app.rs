//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads or generates the dataset
//! - prints reports and renders charts
//! - writes optional exports

use std::fs;
use std::path::Path;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DashboardArgs, DataArgs, ForecastArgs, GenerateArgs, PlotArgs, ReportArgs};
use crate::data::{SampleConfig, generate_sales};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sales` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is normal; real environment variables take precedence.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Generate(args) => handle_generate(args),
        Command::Analyze(args) => handle_analyze(args),
        Command::Advanced(args) => handle_advanced(args),
        Command::Charts(args) => handle_charts(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Report(args) => handle_report(args),
        Command::Plot(args) => handle_plot(args),
        Command::Dashboard(args) => handle_dashboard(args),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed by an embedding program.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output directory '{}': {e}", dir.display())))
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        count: args.count,
        seed: args.seed,
        ..SampleConfig::default()
    };
    let records = generate_sales(&config)?;
    crate::io::export::write_sales_csv(&args.output, &records)?;

    let text = crate::report::format_generation_summary(&records, &args.output.display().to_string())?;
    println!("{text}");
    Ok(())
}

fn handle_analyze(args: DataArgs) -> Result<(), AppError> {
    let data = pipeline::load_dataset(&args.data)?;
    println!("{}", crate::report::format_analysis(&data.records)?);
    Ok(())
}

fn handle_advanced(args: DataArgs) -> Result<(), AppError> {
    let data = pipeline::load_dataset(&args.data)?;
    println!("{}", crate::report::format_advanced(&data.records)?);

    ensure_dir(&args.out_dir)?;
    let path = crate::plot::render_advanced_dashboard(&args.out_dir, &data.records)?;
    println!("Dashboard saved to: {}", path.display());
    Ok(())
}

fn handle_charts(args: DataArgs) -> Result<(), AppError> {
    let data = pipeline::load_dataset(&args.data)?;
    ensure_dir(&args.out_dir)?;

    let paths = crate::plot::render_standard_charts(&args.out_dir, &data.records)?;
    println!("Charts created successfully:");
    for path in paths {
        println!("   - {}", path.display());
    }
    Ok(())
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = args.data.run_config();
    let data = pipeline::load_dataset(&config.data_path)?;
    let run = pipeline::run_forecast(&data.records)?;

    println!("{}", crate::report::format_forecast(&run.forecast, &run.regional));

    if !args.no_chart {
        ensure_dir(&config.out_dir)?;
        let path = config.out_dir.join(crate::plot::FORECAST_FILE);
        crate::plot::render_forecast_chart(
            &path,
            &run.forecast.months,
            &run.forecast.model,
            &run.forecast.points,
            run.forecast.r_squared,
        )?;
        println!("Forecast chart saved to: {}", path.display());
    }

    if let Some(path) = &args.export_json {
        let file = crate::io::forecast_file::to_forecast_file(&run.forecast, &config.data_path, run.last_order_date);
        crate::io::forecast_file::write_forecast_json(path, &file)?;
        println!("Forecast JSON saved to: {}", path.display());
    }
    if let Some(path) = &args.export_csv {
        crate::io::export::write_forecast_csv(path, &run.forecast)?;
        println!("Forecast CSV saved to: {}", path.display());
    }

    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let data = pipeline::load_dataset(&args.data)?;
    let text = crate::report::build_executive_summary(
        &data.records,
        Local::now().naive_local(),
        &args.data.display().to_string(),
    )?;
    crate::report::write_report(&args.report, &text)?;

    if !args.quiet {
        println!("{text}");
    }
    println!("Report saved to: {}", args.report.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::forecast_file::read_forecast_json(&args.forecast)?;
    crate::plot::render_forecast_chart(&args.out, &file.months, &file.model, &file.forecast, file.r_squared)?;
    println!("Forecast chart saved to: {}", args.out.display());
    Ok(())
}

fn handle_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    crate::tui::run(args.data)
}

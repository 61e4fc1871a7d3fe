//! Command-line parsing for the sales analytics tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! aggregation/forecast code. Every path has a flag, an environment variable
//! fallback (also read from `.env`), and a default.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::RunConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Sales analytics: KPIs, charts, forecasts and reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic sales dataset and write it as CSV.
    Generate(GenerateArgs),
    /// Print KPIs, regional and product rankings, and key insights.
    Analyze(DataArgs),
    /// Monthly, quarterly, product, regional and weekday breakdowns plus the
    /// 2x2 dashboard chart.
    Advanced(DataArgs),
    /// Render the region/product bar charts and the regional pie chart.
    Charts(DataArgs),
    /// Fit a linear trend over monthly revenue and project the next 3 months.
    Forecast(ForecastArgs),
    /// Write the executive summary text file.
    Report(ReportArgs),
    /// Re-render the forecast chart from a saved forecast JSON.
    Plot(PlotArgs),
    /// Launch the interactive terminal dashboard.
    Dashboard(DashboardArgs),
}

/// Input dataset and output directory shared by the analysis commands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Sales dataset (CSV).
    #[arg(short = 'd', long, env = "SALES_DATA", default_value = "sales_data.csv")]
    pub data: PathBuf,

    /// Directory for rendered charts.
    #[arg(short = 'o', long, env = "SALES_OUTPUT_DIR", default_value = "charts")]
    pub out_dir: PathBuf,
}

impl DataArgs {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            data_path: self.data.clone(),
            out_dir: self.out_dir.clone(),
        }
    }
}

/// Options for dataset generation.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of orders to generate.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Where to write the CSV.
    #[arg(long, env = "SALES_DATA", default_value = "sales_data.csv")]
    pub output: PathBuf,
}

/// Options for the forecast command.
#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Export the forecast (series, model, projections) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export actual, fitted and forecast rows to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Skip rendering the forecast chart.
    #[arg(long)]
    pub no_chart: bool,
}

/// Options for the executive summary.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Sales dataset (CSV).
    #[arg(short = 'd', long, env = "SALES_DATA", default_value = "sales_data.csv")]
    pub data: PathBuf,

    /// Report output file.
    #[arg(short = 'r', long, env = "SALES_REPORT", default_value = "EXECUTIVE_SUMMARY.txt")]
    pub report: PathBuf,

    /// Do not echo the report to stdout.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Options for the terminal dashboard, which reads a dataset and writes nothing.
#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Sales dataset (CSV).
    #[arg(short = 'd', long, env = "SALES_DATA", default_value = "sales_data.csv")]
    pub data: PathBuf,
}

/// Options for plotting a saved forecast.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Forecast JSON file produced by `sales forecast --export-json`.
    #[arg(long, value_name = "JSON")]
    pub forecast: PathBuf,

    /// Output SVG path.
    #[arg(long, value_name = "SVG", default_value = "sales_forecast.svg")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::parse_from([
            "sales",
            "forecast",
            "--data",
            "in.csv",
            "--export-json",
            "f.json",
            "--no-chart",
        ]);
        match cli.command {
            Command::Forecast(args) => {
                assert_eq!(args.data.data, PathBuf::from("in.csv"));
                assert_eq!(args.export_json, Some(PathBuf::from("f.json")));
                assert!(args.export_csv.is_none());
                assert!(args.no_chart);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn generate_defaults() {
        let cli = Cli::parse_from(["sales", "generate", "--output", "x.csv"]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.count, 500);
                assert_eq!(args.seed, 42);
                assert_eq!(args.output, PathBuf::from("x.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn dashboard_takes_only_a_data_path() {
        let cli = Cli::parse_from(["sales", "dashboard", "--data", "x.csv"]);
        match cli.command {
            Command::Dashboard(args) => assert_eq!(args.data, PathBuf::from("x.csv")),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["sales", "dashboard", "--out-dir", "charts"]).is_err());
    }
}

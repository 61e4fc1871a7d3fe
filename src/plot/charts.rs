//! SVG chart rendering.
//!
//! Every chart is drawn with Plotters' SVG backend into the output directory.
//! Data prep (grouping, shares, fitted values) happens before any drawing so
//! the render functions only map numbers to shapes.

use std::error::Error;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

use crate::analysis::{
    by_calendar_month, by_product, by_quarter, by_region, by_weekday, month_name, product_profitability,
    region_shares, weekday_name,
};
use crate::domain::{ForecastModel, ForecastPoint, MonthlyAggregate, SaleRecord};
use crate::error::{AnalysisError, AppError};

pub const REGION_REVENUE_FILE: &str = "revenue_by_region.svg";
pub const PRODUCT_REVENUE_FILE: &str = "revenue_by_product.svg";
pub const REGION_DISTRIBUTION_FILE: &str = "region_distribution.svg";
pub const FORECAST_FILE: &str = "sales_forecast.svg";
pub const DASHBOARD_FILE: &str = "advanced_dashboard.svg";

const CHART_SIZE: (u32, u32) = (1000, 600);
const DASHBOARD_SIZE: (u32, u32) = (1600, 1200);

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const CORAL: RGBColor = RGBColor(255, 127, 80);
const SEA_GREEN: RGBColor = RGBColor(46, 139, 87);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const CRIMSON: RGBColor = RGBColor(220, 20, 60);
const PURPLE: RGBColor = RGBColor(128, 0, 128);

type DrawResult = Result<(), Box<dyn Error>>;

fn render_failed(path: &Path, e: Box<dyn Error>) -> AppError {
    AppError::new(4, format!("Failed to render chart '{}': {e}", path.display()))
}

/// Upper axis bound with some headroom; never collapses to an empty range.
fn headroom(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 { max * 1.15 } else { 1.0 }
}

fn max_of(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, f64::max)
}

fn segment_label(labels: &[String], v: &SegmentValue<usize>) -> String {
    match v {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn vertical_bars<DB>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
    y_desc: &str,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = values.len();
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..headroom(max_of(values.iter().copied())))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|v| segment_label(labels, v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
            color.filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;
    Ok(())
}

/// Horizontal bars; `colors` is indexed like `values`.
fn horizontal_bars<DB>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
    colors: &[RGBColor],
    x_desc: &str,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = values.len();
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(0.0..headroom(max_of(values.iter().copied())), (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&|v| segment_label(labels, v))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(x_desc)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        let color = colors.get(i).copied().unwrap_or(STEEL_BLUE);
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(i)), (v, SegmentValue::Exact(i + 1))],
            color.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;
    Ok(())
}

/// Pie slices start at 12 o'clock and run counter-clockwise.
fn pie<DB>(area: &DrawingArea<DB, Shift>, title: &str, slices: &[(String, f64)]) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0 + 20.0);
    let radius = f64::from(w.min(h)) * 0.35;
    let point_at = |angle: f64, r: f64| ((cx + r * angle.cos()).round() as i32, (cy - r * angle.sin()).round() as i32);

    let centered = Pos::new(HPos::Center, VPos::Center);
    area.draw(&Text::new(
        title.to_string(),
        ((w / 2) as i32, 30),
        ("sans-serif", 26).into_font().color(&BLACK).pos(centered),
    ))?;

    let mut start = PI / 2.0;
    for (i, (name, pct)) in slices.iter().enumerate() {
        let sweep = pct / 100.0 * 2.0 * PI;
        let steps = ((sweep.to_degrees().ceil()) as usize).max(1);
        let mut outline = Vec::with_capacity(steps + 2);
        outline.push((cx.round() as i32, cy.round() as i32));
        for s in 0..=steps {
            outline.push(point_at(start + sweep * s as f64 / steps as f64, radius));
        }
        area.draw(&Polygon::new(outline, Palette99::pick(i).filled()))?;

        let mid = start + sweep / 2.0;
        area.draw(&Text::new(
            format!("{pct:.1}%"),
            point_at(mid, radius * 0.65),
            ("sans-serif", 18).into_font().color(&BLACK).pos(centered),
        ))?;
        area.draw(&Text::new(
            name.clone(),
            point_at(mid, radius * 1.15),
            ("sans-serif", 20).into_font().color(&BLACK).pos(centered),
        ))?;
        start += sweep;
    }
    Ok(())
}

/// Revenue per region, vertical bars in descending order.
pub fn render_region_revenue(out_dir: &Path, records: &[SaleRecord]) -> Result<PathBuf, AppError> {
    let path = out_dir.join(REGION_REVENUE_FILE);
    let groups = by_region(records);
    let labels: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
    let values: Vec<f64> = groups.iter().map(|g| g.totals.revenue).collect();

    let draw = || -> DrawResult {
        let root = SVGBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        vertical_bars(&root, "Revenue by Region", &labels, &values, STEEL_BLUE, "Revenue ($)")?;
        root.present()?;
        Ok(())
    };
    draw().map_err(|e| render_failed(&path, e))?;
    info!(path = %path.display(), "wrote chart");
    Ok(path)
}

/// Revenue per product, horizontal bars in descending order.
pub fn render_product_revenue(out_dir: &Path, records: &[SaleRecord]) -> Result<PathBuf, AppError> {
    let path = out_dir.join(PRODUCT_REVENUE_FILE);
    let groups = by_product(records);
    let labels: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
    let values: Vec<f64> = groups.iter().map(|g| g.totals.revenue).collect();
    let colors = vec![CORAL; values.len()];

    let draw = || -> DrawResult {
        let root = SVGBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        horizontal_bars(&root, "Revenue by Product", &labels, &values, &colors, "Revenue ($)")?;
        root.present()?;
        Ok(())
    };
    draw().map_err(|e| render_failed(&path, e))?;
    info!(path = %path.display(), "wrote chart");
    Ok(path)
}

/// Share of revenue per region as a pie.
pub fn render_region_distribution(out_dir: &Path, records: &[SaleRecord]) -> Result<PathBuf, AppError> {
    let path = out_dir.join(REGION_DISTRIBUTION_FILE);
    let slices: Vec<(String, f64)> = region_shares(records)?
        .into_iter()
        .map(|(g, pct)| (g.key, pct))
        .collect();

    let draw = || -> DrawResult {
        let root = SVGBackend::new(&path, (800, 800)).into_drawing_area();
        root.fill(&WHITE)?;
        pie(&root, "Sales Distribution by Region", &slices)?;
        root.present()?;
        Ok(())
    };
    draw().map_err(|e| render_failed(&path, e))?;
    info!(path = %path.display(), "wrote chart");
    Ok(path)
}

/// The three charts of the `charts` command.
pub fn render_standard_charts(out_dir: &Path, records: &[SaleRecord]) -> Result<Vec<PathBuf>, AppError> {
    Ok(vec![
        render_region_revenue(out_dir, records)?,
        render_product_revenue(out_dir, records)?,
        render_region_distribution(out_dir, records)?,
    ])
}

/// Actual monthly revenue, the fitted trend extended over the horizon, and
/// the forecast points.
///
/// Takes the pieces shared by an in-memory forecast and a saved forecast file.
pub fn render_forecast_chart(
    path: &Path,
    months: &[MonthlyAggregate],
    model: &ForecastModel,
    points: &[ForecastPoint],
    r_squared: f64,
) -> Result<(), AppError> {
    let actual: Vec<(f64, f64)> = months
        .iter()
        .map(|m| (m.month_index as f64, m.total_revenue))
        .collect();
    let last_index = points
        .iter()
        .map(|p| p.month_index)
        .chain(months.iter().map(|m| m.month_index))
        .max()
        .unwrap_or(1);
    let trend: Vec<(f64, f64)> = (1..=last_index)
        .map(|i| (i as f64, model.predict(i as f64)))
        .collect();
    let predicted: Vec<(f64, f64)> = points.iter().map(|p| (p.month_index as f64, p.revenue)).collect();

    let y_max = headroom(max_of(
        actual
            .iter()
            .chain(trend.iter())
            .chain(predicted.iter())
            .map(|&(_, y)| y),
    ));
    let y_min = trend.iter().map(|&(_, y)| y).fold(0.0, f64::min);
    let x_range = 0.5..(last_index as f64 + 0.5);

    let draw = || -> DrawResult {
        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Sales Forecast (R² = {r_squared:.3})"),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range.clone(), y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Revenue ($)")
            .x_labels(last_index.min(24))
            .x_label_formatter(&|v| format!("{v:.0}"))
            .y_label_formatter(&|v| format!("{v:.0}"))
            .draw()?;

        chart
            .draw_series(LineSeries::new(actual.iter().copied(), STEEL_BLUE.stroke_width(2)))?
            .label("Actual Sales")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], STEEL_BLUE));
        chart.draw_series(actual.iter().map(|&p| Circle::new(p, 4, STEEL_BLUE.filled())))?;

        chart
            .draw_series(LineSeries::new(trend.iter().copied(), CRIMSON))?
            .label("Trend Line")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CRIMSON));

        if let Some(&last_actual) = actual.last() {
            let bridge = std::iter::once(last_actual).chain(predicted.iter().copied());
            chart
                .draw_series(LineSeries::new(bridge, SEA_GREEN.stroke_width(2)))?
                .label("Forecast")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SEA_GREEN));
        }
        chart.draw_series(predicted.iter().map(|&p| Circle::new(p, 5, SEA_GREEN.filled())))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;

        root.present()?;
        Ok(())
    };
    draw().map_err(|e| render_failed(path, e))?;
    info!(path = %path.display(), "wrote chart");
    Ok(())
}

fn margin_color(margin_pct: f64) -> RGBColor {
    if margin_pct > 30.0 {
        SEA_GREEN
    } else if margin_pct > 25.0 {
        ORANGE
    } else {
        CRIMSON
    }
}

fn quarterly_panel<DB>(area: &DrawingArea<DB, Shift>, labels: &[String], revenue: &[f64], profit: &[f64]) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = revenue.len();
    let mut chart = ChartBuilder::on(area)
        .caption("Quarterly Revenue vs Profit", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..headroom(max_of(revenue.iter().copied())))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|v| segment_label(labels, v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .y_desc("Amount ($)")
        .draw()?;

    chart
        .draw_series(revenue.iter().enumerate().map(|(i, &v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                STEEL_BLUE.filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))?
        .label("Revenue")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], STEEL_BLUE.filled()));

    // Profit never exceeds revenue, so a narrower bar nests inside it.
    chart
        .draw_series(profit.iter().enumerate().map(|(i, &v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                SEA_GREEN.filled(),
            );
            bar.set_margin(0, 0, 30, 30);
            bar
        }))?
        .label("Profit")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], SEA_GREEN.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn weekday_panel<DB>(area: &DrawingArea<DB, Shift>, labels: &[String], means: &[f64]) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = means.len();
    let mut chart = ChartBuilder::on(area)
        .caption("Average Revenue by Day of Week", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..headroom(max_of(means.iter().copied())))?;

    chart
        .configure_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|v| segment_label(labels, v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .y_desc("Avg Revenue ($)")
        .draw()?;

    let series: Vec<(SegmentValue<usize>, f64)> = means
        .iter()
        .enumerate()
        .map(|(i, &v)| (SegmentValue::CenterOf(i), v))
        .collect();
    chart.draw_series(LineSeries::new(series.iter().cloned(), PURPLE.stroke_width(3)))?;
    chart.draw_series(series.iter().cloned().map(|p| Circle::new(p, 5, PURPLE.filled())))?;
    Ok(())
}

/// Products in profit order (highest first) with their margin %.
fn product_margins(records: &[SaleRecord]) -> Result<Vec<(String, f64)>, AnalysisError> {
    product_profitability(records)
        .into_iter()
        .map(|g| {
            let margin = g.totals.margin_pct("product profit margin")?;
            Ok((g.key, margin))
        })
        .collect()
}

/// 2×2 dashboard: monthly revenue, quarterly revenue vs profit, product
/// margins and mean revenue per weekday.
pub fn render_advanced_dashboard(out_dir: &Path, records: &[SaleRecord]) -> Result<PathBuf, AppError> {
    let path = out_dir.join(DASHBOARD_FILE);

    let months = by_calendar_month(records);
    let month_labels: Vec<String> = months
        .iter()
        .map(|g| month_name(g.key).chars().take(3).collect())
        .collect();
    let month_revenue: Vec<f64> = months.iter().map(|g| g.totals.revenue).collect();

    let quarters = by_quarter(records);
    let quarter_labels: Vec<String> = quarters.iter().map(|g| format!("Q{}", g.key)).collect();
    let quarter_revenue: Vec<f64> = quarters.iter().map(|g| g.totals.revenue).collect();
    let quarter_profit: Vec<f64> = quarters.iter().map(|g| g.totals.profit).collect();

    let (product_labels, margins): (Vec<String>, Vec<f64>) = product_margins(records)?.into_iter().unzip();
    let margin_colors: Vec<RGBColor> = margins.iter().map(|&m| margin_color(m)).collect();

    let weekdays = by_weekday(records);
    let weekday_labels: Vec<String> = weekdays
        .iter()
        .map(|g| weekday_name(g.key).chars().take(3).collect())
        .collect();
    let weekday_means = weekdays
        .iter()
        .map(|g| g.totals.mean_revenue("weekday mean revenue"))
        .collect::<Result<Vec<f64>, _>>()?;

    let draw = || -> DrawResult {
        let root = SVGBackend::new(&path, DASHBOARD_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled("Advanced Sales Analytics Dashboard", ("sans-serif", 32))?;
        let panels = body.split_evenly((2, 2));
        if let [monthly, quarterly, margin, weekday] = panels.as_slice() {
            vertical_bars(monthly, "Monthly Revenue", &month_labels, &month_revenue, STEEL_BLUE, "Revenue ($)")?;
            quarterly_panel(quarterly, &quarter_labels, &quarter_revenue, &quarter_profit)?;
            horizontal_bars(
                margin,
                "Profit Margin by Product",
                &product_labels,
                &margins,
                &margin_colors,
                "Profit Margin (%)",
            )?;
            weekday_panel(weekday, &weekday_labels, &weekday_means)?;
        }
        root.present()?;
        Ok(())
    };
    draw().map_err(|e| render_failed(&path, e))?;
    info!(path = %path.display(), "wrote chart");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::{record, sample};
    use crate::forecast::forecast_revenue;

    fn assert_svg(path: &Path) {
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("<svg"), "not an SVG: {}", path.display());
    }

    #[test]
    fn standard_charts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let paths = render_standard_charts(dir.path(), &sample()).unwrap();
        assert_eq!(paths.len(), 3);
        for p in &paths {
            assert_svg(p);
        }
        assert!(dir.path().join(REGION_DISTRIBUTION_FILE).exists());
    }

    #[test]
    fn region_chart_labels_every_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_region_revenue(dir.path(), &sample()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        for region in ["North", "South", "East", "West"] {
            assert!(text.contains(region), "missing label {region}");
        }
    }

    #[test]
    fn forecast_chart_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FORECAST_FILE);
        let forecast = forecast_revenue(&sample()).unwrap();
        render_forecast_chart(&path, &forecast.months, &forecast.model, &forecast.points, forecast.r_squared).unwrap();
        assert_svg(&path);
    }

    #[test]
    fn dashboard_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_advanced_dashboard(dir.path(), &sample()).unwrap();
        assert_svg(&path);
    }

    #[test]
    fn pie_of_zero_revenue_is_an_analysis_error() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("A", "2024-01-05", "Gift", "North", 1, 0.0, 0.0)];
        let err = render_region_distribution(dir.path(), &records).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn margin_panel_follows_profit_order() {
        // Laptop leads on revenue, Tablet on profit.
        let records = vec![
            record("A", "2024-01-05", "Laptop", "North", 1, 1000.0, 100.0),
            record("B", "2024-01-06", "Tablet", "North", 1, 500.0, 200.0),
            record("C", "2024-02-07", "Yoga Mat", "South", 1, 40.0, 10.0),
        ];
        let margins = product_margins(&records).unwrap();
        let names: Vec<&str> = margins.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Tablet", "Laptop", "Yoga Mat"]);
        assert!((margins[0].1 - 40.0).abs() < 1e-9);
        assert!((margins[1].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn margin_colors_follow_thresholds() {
        assert_eq!(margin_color(31.0).rgb(), SEA_GREEN.rgb());
        assert_eq!(margin_color(27.0).rgb(), ORANGE.rgb());
        assert_eq!(margin_color(25.0).rgb(), CRIMSON.rgb());
    }

    #[test]
    fn missing_output_dir_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = render_region_revenue(&missing, &sample()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}

//! Ratatui-based terminal dashboard.
//!
//! Shows the dataset KPIs, the monthly revenue trend with its fitted line and
//! forecast, quarterly and weekday bars, and product margins. `r` reloads the
//! input file, `q` quits.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::analysis::weekday_name;
use crate::app::pipeline::{DashboardData, load_dashboard};
use crate::domain::Forecast;
use crate::error::AppError;
use crate::report::fmt_thousands;

mod plotters_chart;

use plotters_chart::TrendChart;

/// Start the dashboard.
///
/// The dataset is loaded before the terminal switches to raw mode so load
/// errors print normally.
pub fn run(data_path: PathBuf) -> Result<(), AppError> {
    let mut app = App::new(data_path)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    data_path: PathBuf,
    data: DashboardData,
    status: String,
}

impl App {
    fn new(data_path: PathBuf) -> Result<Self, AppError> {
        let data = load_dashboard(&data_path)?;
        let status = format!("Loaded {} rows.", data.rows_used);
        Ok(Self {
            data_path,
            data,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the dashboard should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    /// A failed reload keeps the previous data on screen.
    fn reload(&mut self) {
        match load_dashboard(&self.data_path) {
            Ok(data) => {
                self.status = format!("Reloaded {} rows ({} skipped).", data.rows_used, data.rows_skipped);
                self.data = data;
            }
            Err(err) => {
                self.status = format!("Reload failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let d = &self.data;
        let k = &d.kpis;
        let gray = Style::default().fg(Color::Gray);

        let mut lines = vec![Line::from(vec![
            Span::styled("sales", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " dashboard | {} | {} rows ({} skipped) | {} to {}",
                d.source.display(),
                d.rows_used,
                d.rows_skipped,
                k.first_date,
                k.last_date
            )),
        ])];
        lines.push(Line::from(Span::styled(
            format!(
                "revenue ${} | profit ${} | margin {:.1}% | orders {} | AOV ${:.2}",
                fmt_thousands(k.total_revenue, 2),
                fmt_thousands(k.total_profit, 2),
                k.profit_margin_pct,
                k.total_orders,
                k.avg_order_value,
            ),
            gray,
        )));
        let outlook = match &d.forecast {
            Ok(f) => format!(
                "next 3 months ${} | growth {:+.2}% | R² {:.1}%",
                fmt_thousands(f.forecast_total, 2),
                f.growth_pct,
                f.accuracy_pct()
            ),
            Err(err) => format!("no forecast: {err}"),
        };
        lines.push(Line::from(Span::styled(outlook, gray)));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ])
            .split(rows[1]);

        self.draw_trend(frame, rows[0]);
        self.draw_quarters(frame, panels[0]);
        self.draw_weekdays(frame, panels[1]);
        self.draw_margins(frame, panels[2]);
    }

    fn draw_trend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Monthly revenue (cyan) / trend (red) / forecast (green)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let forecast = match &self.data.forecast {
            Ok(f) => f,
            Err(err) => {
                let msg = Paragraph::new(format!("No trend: {err}")).style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
                return;
            }
        };

        let series = trend_series(forecast);
        let widget = TrendChart {
            actual: &series.actual,
            fitted: &series.fitted,
            forecast: &series.forecast,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            fmt_x: fmt_axis_month,
            fmt_y: fmt_axis_compact,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_quarters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels: Vec<(String, u64)> = self
            .data
            .quarters
            .iter()
            .map(|g| (format!("Q{}", g.key), bar_value(g.totals.revenue)))
            .collect();
        let bars: Vec<(&str, u64)> = labels.iter().map(|(l, v)| (l.as_str(), *v)).collect();

        let chart = BarChart::default()
            .block(Block::default().title("Quarterly revenue ($)").borders(Borders::ALL))
            .data(bars.as_slice())
            .bar_width(7)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        frame.render_widget(chart, area);
    }

    fn draw_weekdays(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels: Vec<(String, u64)> = self
            .data
            .weekday_means
            .iter()
            .map(|&(day, mean)| (weekday_name(day).chars().take(3).collect(), bar_value(mean)))
            .collect();
        let bars: Vec<(&str, u64)> = labels.iter().map(|(l, v)| (l.as_str(), *v)).collect();

        let chart = BarChart::default()
            .block(Block::default().title("Mean order revenue by weekday ($)").borders(Borders::ALL))
            .data(bars.as_slice())
            .bar_width(4)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Magenta))
            .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
        frame.render_widget(chart, area);
    }

    fn draw_margins(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let header = Row::new(vec!["Product", "Profit", "Margin"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
        let rows = self.data.product_margins.iter().map(|(g, margin)| {
            Row::new(vec![
                Cell::from(g.key.clone()),
                Cell::from(format!("{:>12}", fmt_thousands(g.totals.profit, 0))),
                Cell::from(format!("{margin:>5.1}%")).style(Style::default().fg(margin_color(*margin))),
            ])
        });

        let table = Table::new(
            rows,
            [Constraint::Min(12), Constraint::Length(12), Constraint::Length(7)],
        )
        .header(header)
        .block(Block::default().title("Products by profit").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("r reload  q quit", Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready series for the trend panel.
#[derive(Debug, Clone, PartialEq)]
struct TrendSeries {
    actual: Vec<(f64, f64)>,
    fitted: Vec<(f64, f64)>,
    forecast: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn trend_series(forecast: &Forecast) -> TrendSeries {
    let actual: Vec<(f64, f64)> = forecast
        .months
        .iter()
        .map(|m| (m.month_index as f64, m.total_revenue))
        .collect();
    let fitted: Vec<(f64, f64)> = forecast
        .months
        .iter()
        .zip(&forecast.fitted)
        .map(|(m, &y)| (m.month_index as f64, y))
        .collect();
    let forecast_points: Vec<(f64, f64)> = actual
        .last()
        .copied()
        .into_iter()
        .chain(forecast.points.iter().map(|p| (p.month_index as f64, p.revenue)))
        .collect();

    let last_x = forecast_points.last().map(|&(x, _)| x).unwrap_or(1.0);
    let x_bounds = [0.5, last_x + 0.5];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in actual.iter().chain(&fitted).chain(&forecast_points) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = y_max.max(1.0);
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-9);

    TrendSeries {
        actual,
        fitted,
        forecast: forecast_points,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// Bar charts take whole units; negative or NaN values draw as empty bars.
fn bar_value(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 { v.round() as u64 } else { 0 }
}

fn margin_color(margin_pct: f64) -> Color {
    if margin_pct > 30.0 {
        Color::Green
    } else if margin_pct > 25.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn fmt_axis_month(v: f64) -> String {
    format!("{v:.0}")
}

/// `12345.0 -> "12.3k"`, keeps the narrow left label area readable.
fn fmt_axis_compact(v: f64) -> String {
    if v.abs() >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v.abs() >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::sample;
    use crate::forecast::forecast_revenue;

    #[test]
    fn trend_series_bridges_last_month_into_forecast() {
        let forecast = forecast_revenue(&sample()).unwrap();
        let s = trend_series(&forecast);
        let n = forecast.months.len();

        assert_eq!(s.actual.len(), n);
        assert_eq!(s.fitted.len(), n);
        assert_eq!(s.forecast.len(), 4);
        assert_eq!(s.forecast[0], s.actual[n - 1]);
        assert_eq!(s.x_bounds, [0.5, (n + 3) as f64 + 0.5]);
        assert!(s.y_bounds[0] < s.y_bounds[1]);
    }

    #[test]
    fn compact_axis_labels() {
        assert_eq!(fmt_axis_compact(950.0), "950");
        assert_eq!(fmt_axis_compact(12_345.0), "12.3k");
        assert_eq!(fmt_axis_compact(2_500_000.0), "2.5M");
    }

    #[test]
    fn bar_values_clamp_to_whole_units() {
        assert_eq!(bar_value(12.6), 13);
        assert_eq!(bar_value(-4.0), 0);
        assert_eq!(bar_value(f64::NAN), 0);
    }

    #[test]
    fn quit_and_reload_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        crate::io::export::write_sales_csv(&path, &sample()).unwrap();
        let mut app = App::new(path.clone()).unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(!app.handle_key(KeyCode::Char('r')));
        assert!(app.status.starts_with("Reload failed"));
        assert_eq!(app.data.rows_used, 500);

        assert!(app.handle_key(KeyCode::Char('q')));
    }
}

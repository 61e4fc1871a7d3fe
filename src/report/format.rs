//! Formatted terminal output for the `generate`, `analyze`, `advanced` and
//! `forecast` commands.
//!
//! We keep formatting code in one place so:
//! - the aggregation/forecast code stays clean and testable
//! - output changes are localized


use crate::analysis::{
    Group, best_by, by_calendar_month, by_product, by_quarter, by_weekday, compute_kpis, highest_margin,
    month_name, product_profitability, region_shares, top_products_per_region, weekday_name, worst_by,
};
use crate::domain::{Forecast, RegionForecast, SaleRecord};
use crate::error::AnalysisError;

const RULE_WIDTH: usize = 60;

/// Each full block of the weekday bar stands for this much mean revenue.
const BAR_UNIT: f64 = 200.0;

/// Group the integer part of a number in thousands: `1234567.891 -> "1,234,567.89"`.
pub fn fmt_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(f) = frac_part {
        grouped.push('.');
        grouped.push_str(f);
    }

    let is_zero = raw.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Currency with cents: `"$1,234.50"`.
pub fn fmt_money(value: f64) -> String {
    format!("${}", fmt_thousands(value, 2))
}

pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

fn section(out: &mut String, title: &str) {
    let bar = rule('=', RULE_WIDTH);
    out.push_str(&format!("\n{bar}\n{title}\n{bar}\n"));
}

/// Summary printed after generating a dataset.
pub fn format_generation_summary(records: &[SaleRecord], path: &str) -> Result<String, AnalysisError> {
    let kpis = compute_kpis(records)?;
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule('=', 50)));
    out.push_str("Data generated successfully\n");
    out.push_str(&format!("{}\n", rule('=', 50)));
    out.push_str("\nSUMMARY:\n");
    out.push_str(&format!("   - Total Orders: {}\n", kpis.total_orders));
    out.push_str(&format!("   - Total Revenue: {}\n", fmt_money(kpis.total_revenue)));
    out.push_str(&format!("   - Total Profit: {}\n", fmt_money(kpis.total_profit)));
    out.push_str(&format!("   - Date Range: {} to {}\n", kpis.first_date, kpis.last_date));
    out.push_str(&format!("\nSaved to: {path}\n"));

    out.push_str("\nFirst 5 records:\n");
    out.push_str(&format!(
        "{:<10} {:<10} {:<13} {:<6} {:>3} {:>9} {:>10} {:>9}\n",
        "Order_ID", "Date", "Product", "Region", "Qty", "Price", "Revenue", "Profit"
    ));
    for r in records.iter().take(5) {
        out.push_str(&format!(
            "{:<10} {:<10} {:<13} {:<6} {:>3} {:>9.2} {:>10.2} {:>9.2}\n",
            r.order_id, r.date, r.product, r.region, r.quantity, r.unit_price, r.revenue, r.profit
        ));
    }
    Ok(out)
}

/// KPI dashboard: totals, regional and product rankings, insights.
pub fn format_analysis(records: &[SaleRecord]) -> Result<String, AnalysisError> {
    let kpis = compute_kpis(records)?;
    let regions = region_shares(records)?;
    let products = by_product(records);
    let profits = product_profitability(records);

    let mut out = String::new();

    section(&mut out, "KEY PERFORMANCE INDICATORS (KPIs)");
    out.push_str(&format!("\nTotal Revenue:        {}\n", fmt_money(kpis.total_revenue)));
    out.push_str(&format!("Total Profit:         {}\n", fmt_money(kpis.total_profit)));
    out.push_str(&format!("Total Orders:         {}\n", kpis.total_orders));
    out.push_str(&format!("Average Order Value:  ${:.2}\n", kpis.avg_order_value));
    out.push_str(&format!("Profit Margin:        {:.2}%\n", kpis.profit_margin_pct));

    section(&mut out, "REGIONAL PERFORMANCE");
    out.push_str("\nRevenue by Region:\n");
    for (g, pct) in &regions {
        out.push_str(&format!(
            "   {:<10}  ${:>10}  ({pct:>5.1}%)\n",
            g.key,
            fmt_thousands(g.totals.revenue, 2)
        ));
    }
    let best_region = regions.first().map(|(g, _)| g);
    if let Some(g) = best_region {
        out.push_str(&format!("\nBest Region: {} with {}\n", g.key, fmt_money(g.totals.revenue)));
    }

    section(&mut out, "PRODUCT PERFORMANCE");
    out.push_str("\nRevenue by Product:\n");
    for (i, g) in products.iter().enumerate() {
        out.push_str(&format!("   {}. {:<15}  ${:>10}\n", i + 1, g.key, fmt_thousands(g.totals.revenue, 2)));
    }
    if let Some(g) = products.first() {
        out.push_str(&format!("\nTop Product: {} with {}\n", g.key, fmt_money(g.totals.revenue)));
    }

    section(&mut out, "PROFITABILITY ANALYSIS");
    out.push_str("\nProfit by Product:\n");
    for (i, g) in profits.iter().enumerate() {
        out.push_str(&format!("   {}. {:<15}  ${:>10}\n", i + 1, g.key, fmt_thousands(g.totals.profit, 2)));
    }
    if let Some(g) = profits.first() {
        out.push_str(&format!(
            "\nMost Profitable: {} with {} profit\n",
            g.key,
            fmt_money(g.totals.profit)
        ));
    }

    section(&mut out, "KEY INSIGHTS");
    let name = |g: Option<&Group<String>>| g.map(|g| g.key.clone()).unwrap_or_else(|| "-".to_string());
    out.push_str(&format!("\n1. Our {} region is performing the best!\n", name(best_region)));
    out.push_str(&format!("2. {} is our top-selling product\n", name(products.first())));
    out.push_str(&format!("3. {} generates the most profit\n", name(profits.first())));
    out.push_str(&format!("4. We're making {:.1}% profit margin overall\n", kpis.profit_margin_pct));

    Ok(out)
}

/// Deep-dive: calendar months, quarters, product profitability, regional
/// product mix, weekdays, insights.
pub fn format_advanced(records: &[SaleRecord]) -> Result<String, AnalysisError> {
    let kpis = compute_kpis(records)?;
    let months = by_calendar_month(records);
    let quarters = by_quarter(records);
    let products = product_profitability(records);
    let regional_mix = top_products_per_region(records, 3);
    let weekdays = by_weekday(records);

    let mut out = String::new();

    section(&mut out, "MONTHLY PERFORMANCE");
    out.push_str("\nRevenue by Month:\n");
    for g in &months {
        out.push_str(&format!(
            "{:<12} -> Revenue: ${:>10}  |  Orders: {:>3}  |  Avg: ${:>8}\n",
            month_name(g.key),
            fmt_thousands(g.totals.revenue, 2),
            g.totals.orders,
            fmt_thousands(g.totals.mean_revenue("monthly average")?, 2)
        ));
    }
    let best_month = best_by(&months, |t| t.revenue);
    if let (Some(best), Some(worst)) = (best_month, worst_by(&months, |t| t.revenue)) {
        out.push_str(&format!(
            "\nBest Month: {} ({})\n",
            month_name(best.key),
            fmt_money(best.totals.revenue)
        ));
        out.push_str(&format!(
            "Worst Month: {} ({})\n",
            month_name(worst.key),
            fmt_money(worst.totals.revenue)
        ));
    }

    section(&mut out, "QUARTERLY BREAKDOWN");
    out.push_str("\nQuarterly Performance:\n");
    for g in &quarters {
        out.push_str(&format!(
            "Q{}: Revenue ${:>10}  |  Profit ${:>10}  |  Margin {:.2}%  |  Orders {}\n",
            g.key,
            fmt_thousands(g.totals.revenue, 2),
            fmt_thousands(g.totals.profit, 2),
            g.totals.margin_pct("quarterly profit margin")?,
            g.totals.orders
        ));
    }

    section(&mut out, "PRODUCT PROFITABILITY RANKING");
    out.push_str("\nProduct Profitability:\n");
    out.push_str(&format!(
        "{:<15} {:>12} {:>12} {:>8} {:>7} {:>12}\n",
        "Product", "Revenue", "Profit", "Margin", "Orders", "Avg Order"
    ));
    out.push_str(&format!("{}\n", rule('-', 75)));
    for g in &products {
        out.push_str(&format!(
            "{:<15} ${:>10} ${:>10} {:>6.2}% {:>7} ${:>10}\n",
            g.key,
            fmt_thousands(g.totals.revenue, 2),
            fmt_thousands(g.totals.profit, 2),
            g.totals.margin_pct("product profit margin")?,
            g.totals.orders,
            fmt_thousands(g.totals.mean_revenue("average order value")?, 2)
        ));
    }

    section(&mut out, "REGIONAL PRODUCT PREFERENCES");
    for (region, top) in &regional_mix {
        out.push_str(&format!("\n{region} Region - Top 3 Products:\n"));
        for (i, g) in top.iter().enumerate() {
            out.push_str(&format!("   {}. {:<15} ${:>10}\n", i + 1, g.key, fmt_thousands(g.totals.revenue, 2)));
        }
    }

    section(&mut out, "SALES BY DAY OF WEEK");
    out.push_str("\nAverage Revenue by Day:\n");
    let mut best_day: Option<(u32, f64)> = None;
    for g in &weekdays {
        let mean = g.totals.mean_revenue("weekday average")?;
        out.push_str(&format!("{:<10} ${:>8} {}\n", weekday_name(g.key), fmt_thousands(mean, 2), weekday_bar(mean)));
        if best_day.is_none_or(|(_, m)| mean > m) {
            best_day = Some((g.key, mean));
        }
    }

    section(&mut out, "KEY BUSINESS INSIGHTS");
    let (top_margin, top_margin_pct) = match highest_margin(&products)? {
        Some((g, m)) => (g.key.as_str(), m),
        None => ("-", 0.0),
    };
    out.push_str(&format!(
        "\n1. Best performing month: {}\n",
        best_month.map(|g| month_name(g.key)).unwrap_or("-")
    ));
    out.push_str(&format!(
        "2. Most profitable product: {}\n",
        products.first().map(|g| g.key.as_str()).unwrap_or("-")
    ));
    out.push_str(&format!("3. Highest margin product: {top_margin} ({top_margin_pct:.1}%)\n"));
    out.push_str(&format!(
        "4. Best day for sales: {}\n",
        best_day.map(|(d, _)| weekday_name(d)).unwrap_or("-")
    ));
    out.push_str(&format!("5. Overall profit margin: {:.2}%\n", kpis.profit_margin_pct));

    Ok(out)
}

/// One `█` per [`BAR_UNIT`] of mean revenue (truncated).
pub fn weekday_bar(mean: f64) -> String {
    let blocks = (mean / BAR_UNIT).max(0.0).floor() as usize;
    rule('█', blocks)
}

/// Forecast report: accuracy, next months, growth, regional outlook.
pub fn format_forecast(forecast: &Forecast, regional: &[RegionForecast]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Analyzed {} months of data\n", forecast.months.len()));
    out.push_str(&format!("Model Accuracy: {:.2}%\n", forecast.accuracy_pct()));
    out.push_str(&format!(
        "Trend: {:+.2} per month (intercept {:.2})\n",
        forecast.model.slope, forecast.model.intercept
    ));

    section(&mut out, "SALES FORECAST - NEXT 3 MONTHS");
    out.push_str("\nPredicted Revenue:\n");
    for (i, p) in forecast.points.iter().enumerate() {
        out.push_str(&format!("   {}. {:<15}  ${:>12}\n", i + 1, p.label, fmt_thousands(p.revenue, 2)));
    }
    out.push_str(&format!(
        "\nTotal Predicted ({} months): {}\n",
        forecast.points.len(),
        fmt_money(forecast.forecast_total)
    ));
    out.push_str(&format!("Projected Growth: {:+.2}%\n", forecast.growth_pct));

    section(&mut out, "REGIONAL FORECASTS");
    for r in regional {
        match &r.outcome {
            Ok(next) => {
                out.push_str(&format!(
                    "\n{:<10} -> Next month predicted: ${:>12}\n",
                    r.region,
                    fmt_thousands(*next, 2)
                ));
            }
            Err(err) => {
                out.push_str(&format!("\n{:<10} -> no forecast: {err}\n", r.region));
            }
        }
    }

    section(&mut out, "SUMMARY");
    out.push_str(&format!("   - Historical months analyzed: {}\n", forecast.months.len()));
    out.push_str(&format!("   - Model accuracy: {:.2}%\n", forecast.accuracy_pct()));
    out.push_str(&format!("   - Forecast period: {} months\n", forecast.points.len()));
    out.push_str(&format!("   - Projected revenue: {}\n", fmt_money(forecast.forecast_total)));
    out.push_str(&format!("   - Growth trend: {:+.2}%\n", forecast.growth_pct));

    out
}

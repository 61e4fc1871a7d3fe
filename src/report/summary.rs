//! Executive summary report (plain text, fixed section layout).

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

use crate::analysis::{
    best_by, by_calendar_month, by_product, by_quarter, compute_kpis, highest_margin, month_name, region_shares,
    regional_consistency,
};
use crate::domain::SaleRecord;
use crate::error::{AnalysisError, AppError};
use crate::forecast::monthly_revenue;
use crate::report::format::{fmt_money, fmt_thousands, rule};

const WIDTH: usize = 70;

/// Margin above which operations count as healthy.
const HEALTHY_MARGIN_PCT: f64 = 25.0;

const TOP_PRODUCTS: usize = 5;

fn banner(out: &mut String, title: &str) {
    let bar = rule('=', WIDTH);
    out.push_str(&format!("\n{bar}\n{}\n{bar}\n", format!("{title:^WIDTH$}").trim_end()));
}

/// Revenue change from the first to the last observed month, in percent.
///
/// A single observed month has no trend and yields 0.
pub fn start_to_end_growth_pct(records: &[SaleRecord]) -> Result<f64, AnalysisError> {
    let months = monthly_revenue(records);
    let (Some(first), Some(last)) = (months.first(), months.last()) else {
        return Err(AnalysisError::empty("growth trend"));
    };
    if months.len() < 2 {
        return Ok(0.0);
    }
    if first.total_revenue == 0.0 {
        return Err(AnalysisError::zero_denominator("growth trend (first month revenue is zero)"));
    }
    Ok((last.total_revenue - first.total_revenue) / first.total_revenue * 100.0)
}

/// Build the executive summary text.
pub fn build_executive_summary(
    records: &[SaleRecord],
    generated_at: NaiveDateTime,
    source: &str,
) -> Result<String, AnalysisError> {
    let kpis = compute_kpis(records)?;
    let regions = region_shares(records)?;
    let products = by_product(records);
    let months = by_calendar_month(records);
    let quarters = by_quarter(records);
    let growth = start_to_end_growth_pct(records)?;

    let (best_region, best_region_share) = regions
        .first()
        .map(|(g, pct)| (g.key.as_str(), *pct))
        .ok_or_else(|| AnalysisError::empty("regional performance"))?;
    let best_product = products
        .first()
        .ok_or_else(|| AnalysisError::empty("product performance"))?;
    let (top_margin, top_margin_pct) = highest_margin(&products)?
        .map(|(g, m)| (g.key.as_str(), m))
        .ok_or_else(|| AnalysisError::empty("product margins"))?;
    let best_month = best_by(&months, |t| t.revenue).ok_or_else(|| AnalysisError::empty("temporal analysis"))?;

    let region_revenues: Vec<f64> = regions.iter().map(|(g, _)| g.totals.revenue).collect();
    let consistent = regional_consistency(&region_revenues);

    let mut out = String::new();

    banner(&mut out, "SALES PERFORMANCE EXECUTIVE SUMMARY");
    out.push_str(&format!("\nReport Generated: {}\n", generated_at.format("%B %d, %Y at %I:%M %p")));
    out.push_str(&format!(
        "Analysis Period: {} - {}\n",
        kpis.first_date.format("%B %Y"),
        kpis.last_date.format("%B %Y")
    ));

    banner(&mut out, "KEY PERFORMANCE INDICATORS");
    out.push_str("\nFinancial Performance:\n");
    out.push_str(&format!("   - Total Revenue:              ${:>15}\n", fmt_thousands(kpis.total_revenue, 2)));
    out.push_str(&format!("   - Total Profit:               ${:>15}\n", fmt_thousands(kpis.total_profit, 2)));
    out.push_str(&format!("   - Profit Margin:              {:>15.2}%\n", kpis.profit_margin_pct));
    out.push_str(&format!("   - Average Order Value:        ${:>15}\n", fmt_thousands(kpis.avg_order_value, 2)));
    out.push_str("\nSales Volume:\n");
    out.push_str(&format!(
        "   - Total Orders:               {:>15}\n",
        fmt_thousands(kpis.total_orders as f64, 0)
    ));
    out.push_str(&format!("   - Average Orders per Day:     {:>15.1}\n", kpis.avg_orders_per_day));

    banner(&mut out, "REGIONAL PERFORMANCE");
    out.push_str("\nRevenue by Region:\n");
    for (g, pct) in &regions {
        out.push_str(&format!(
            "   - {:<10}  ${:>12}  ({pct:>5.1}% of total)\n",
            g.key,
            fmt_thousands(g.totals.revenue, 2)
        ));
    }
    out.push_str(&format!("\nTop Performing Region: {best_region}\n"));

    banner(&mut out, "PRODUCT PERFORMANCE");
    out.push_str(&format!("\nTop {TOP_PRODUCTS} Products by Revenue:\n"));
    for (i, g) in products.iter().take(TOP_PRODUCTS).enumerate() {
        out.push_str(&format!("   {}. {:<15}  ${:>12}\n", i + 1, g.key, fmt_thousands(g.totals.revenue, 2)));
    }
    out.push_str(&format!("\nBest Selling Product: {}\n", best_product.key));
    out.push_str(&format!("Highest Profit Margin: {top_margin} ({top_margin_pct:.1}%)\n"));

    banner(&mut out, "TEMPORAL ANALYSIS");
    out.push_str(&format!(
        "\nBest Performing Month: {} ({})\n",
        month_name(best_month.key),
        fmt_money(best_month.totals.revenue)
    ));
    out.push_str("\nQuarterly Breakdown:\n");
    for g in &quarters {
        out.push_str(&format!(
            "   Q{}: Revenue ${:>12}  |  Profit ${:>12}  |  Margin {:.1}%\n",
            g.key,
            fmt_thousands(g.totals.revenue, 2),
            fmt_thousands(g.totals.profit, 2),
            g.totals.margin_pct("quarterly profit margin")?
        ));
    }

    banner(&mut out, "KEY INSIGHTS & RECOMMENDATIONS");
    out.push_str("\nStrategic Insights:\n");
    out.push_str("\n1. Regional Focus:\n");
    out.push_str(&format!(
        "   -> {best_region} region leads with {best_region_share:.1}% of total revenue\n"
    ));
    out.push_str(&format!("   -> Recommendation: Increase marketing investment in {best_region} region\n"));

    out.push_str("\n2. Product Strategy:\n");
    out.push_str(&format!(
        "   -> {} generates highest revenue ({})\n",
        best_product.key,
        fmt_money(best_product.totals.revenue)
    ));
    out.push_str(&format!("   -> {top_margin} has best profit margin ({top_margin_pct:.1}%)\n"));
    out.push_str(&format!(
        "   -> Recommendation: Expand {top_margin} product line for better margins\n"
    ));

    out.push_str("\n3. Growth Trend:\n");
    out.push_str(&format!(
        "   -> {} trend: {growth:+.1}% growth from start to end period\n",
        if growth > 0.0 { "Positive" } else { "Negative" }
    ));
    out.push_str(&format!(
        "   -> Recommendation: {}\n",
        if growth > 0.0 {
            "Maintain current strategies"
        } else {
            "Review sales strategies"
        }
    ));

    out.push_str("\n4. Operational Efficiency:\n");
    out.push_str(&format!(
        "   -> Profit margin of {:.1}% is {}\n",
        kpis.profit_margin_pct,
        if kpis.profit_margin_pct > HEALTHY_MARGIN_PCT {
            "healthy"
        } else {
            "acceptable"
        }
    ));
    out.push_str(&format!("   -> Average order value: ${:.2}\n", kpis.avg_order_value));
    out.push_str("   -> Recommendation: Focus on upselling to increase AOV\n");

    banner(&mut out, "CONCLUSION");
    let strong = kpis.profit_margin_pct > HEALTHY_MARGIN_PCT && growth > 0.0;
    out.push_str(&format!(
        "\nOverall Performance: {}\n",
        if strong { "STRONG" } else { "MODERATE" }
    ));
    out.push_str(&format!(
        "\nThe sales data shows {}.\n",
        if consistent {
            "strong performance across all regions"
        } else {
            "varied regional performance"
        }
    ));
    out.push_str(&format!(
        "{} and {top_margin} are key revenue and profit drivers respectively.\n",
        best_product.key
    ));
    out.push_str("\nNext Steps:\n");
    out.push_str(&format!("   1. Implement targeted campaigns in {best_region} region\n"));
    out.push_str(&format!("   2. Increase inventory for {}\n", best_product.key));
    out.push_str(&format!("   3. Optimize pricing for {top_margin} to maximize margins\n"));
    out.push_str("   4. Monitor monthly trends and adjust strategies quarterly\n");

    out.push_str(&format!("\n{}\n", rule('=', WIDTH)));
    out.push_str("\nReport prepared by: Sales Analytics System\n");
    out.push_str(&format!("Data source: {source}\n"));
    out.push_str(&format!(
        "Total records analyzed: {}\n",
        fmt_thousands(kpis.total_orders as f64, 0)
    ));
    out.push_str(&format!("\n{}\n", rule('=', WIDTH)));

    Ok(out)
}

/// Write the report text to `path`.
pub fn write_report(path: &Path, text: &str) -> Result<(), AppError> {
    std::fs::write(path, text)
        .map_err(|e| AppError::new(2, format!("Failed to write report '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote executive summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::{record, sample};
    use chrono::NaiveDate;

    fn report_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(14, 30, 0).unwrap()
    }

    #[test]
    fn report_has_fixed_sections_in_order() {
        let text = build_executive_summary(&sample(), report_time(), "sales_data.csv").unwrap();
        let headings = [
            "SALES PERFORMANCE EXECUTIVE SUMMARY",
            "KEY PERFORMANCE INDICATORS",
            "REGIONAL PERFORMANCE",
            "PRODUCT PERFORMANCE",
            "TEMPORAL ANALYSIS",
            "KEY INSIGHTS & RECOMMENDATIONS",
            "CONCLUSION",
        ];
        let mut last = 0;
        for h in headings {
            let pos = text[last..].find(h).map(|p| p + last);
            assert!(pos.is_some(), "missing or out of order: {h}");
            last = pos.unwrap_or(last);
        }
        assert!(text.contains("Report Generated: November 05, 2024 at 02:30 PM"));
        assert!(text.contains("Analysis Period: January 2024 - October 2024"));
        assert!(text.contains("Total records analyzed: 500"));
        assert!(text.contains("Data source: sales_data.csv"));
    }

    #[test]
    fn growth_compares_first_and_last_month() {
        let records = vec![
            record("A", "2024-01-05", "Laptop", "North", 1, 100.0, 30.0),
            record("B", "2024-03-05", "Laptop", "North", 1, 150.0, 30.0),
        ];
        assert_eq!(start_to_end_growth_pct(&records).unwrap(), 50.0);

        let single = vec![record("A", "2024-01-05", "Laptop", "North", 1, 100.0, 30.0)];
        assert_eq!(start_to_end_growth_pct(&single).unwrap(), 0.0);

        let zero_start = vec![
            record("A", "2024-01-05", "Gift", "North", 1, 0.0, 0.0),
            record("B", "2024-02-05", "Laptop", "North", 1, 150.0, 30.0),
        ];
        assert!(matches!(
            start_to_end_growth_pct(&zero_start),
            Err(AnalysisError::ZeroDenominator { .. })
        ));
    }

    #[test]
    fn conclusion_reflects_margin_and_growth() {
        let records = vec![
            record("A", "2024-01-05", "Laptop", "North", 1, 100.0, 30.0),
            record("B", "2024-02-05", "Tablet", "South", 2, 60.0, 40.0),
        ];
        let text = build_executive_summary(&records, report_time(), "x.csv").unwrap();
        // margin 70/220 = 31.8%, growth +20%
        assert!(text.contains("Overall Performance: STRONG"));
        assert!(text.contains("Profit margin of 31.8% is healthy"));
        assert!(text.contains("Positive trend: +20.0% growth"));
        // 100 vs 120 is within 20% of the mean
        assert!(text.contains("strong performance across all regions"));
    }

    #[test]
    fn empty_dataset_is_an_error() {
        assert!(matches!(
            build_executive_summary(&[], report_time(), "x.csv"),
            Err(AnalysisError::EmptyDataset { .. })
        ));
    }
}

//! Headline KPIs over the whole dataset.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::SaleRecord;
use crate::error::AnalysisError;

/// Dataset-wide KPIs.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_orders: usize,
    /// Mean revenue per record.
    pub avg_order_value: f64,
    pub profit_margin_pct: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Number of distinct order dates.
    pub active_days: usize,
    pub avg_orders_per_day: f64,
}

pub fn compute_kpis(records: &[SaleRecord]) -> Result<Kpis, AnalysisError> {
    let (Some(first), Some(last)) = (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) else {
        return Err(AnalysisError::empty("KPIs"));
    };

    let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();
    let total_orders = records.len();
    let active_days = records.iter().map(|r| r.date).collect::<BTreeSet<_>>().len();

    Ok(Kpis {
        total_revenue,
        total_profit,
        total_orders,
        avg_order_value: total_revenue / total_orders as f64,
        profit_margin_pct: profit_margin_pct(total_profit, total_revenue, "overall profit margin")?,
        first_date: first,
        last_date: last,
        active_days,
        avg_orders_per_day: total_orders as f64 / active_days as f64,
    })
}

/// `profit / revenue * 100`.
pub fn profit_margin_pct(profit: f64, revenue: f64, context: &str) -> Result<f64, AnalysisError> {
    if revenue == 0.0 {
        return Err(AnalysisError::zero_denominator(context));
    }
    Ok(profit / revenue * 100.0)
}

/// `part / whole * 100`.
pub fn share_pct(part: f64, whole: f64, context: &str) -> Result<f64, AnalysisError> {
    if whole == 0.0 {
        return Err(AnalysisError::zero_denominator(context));
    }
    Ok(part / whole * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::record;

    #[test]
    fn kpis_over_small_dataset() {
        let records = vec![
            record("ORD-1", "2024-01-02", "Laptop", "North", 2, 100.0, 50.0),
            record("ORD-2", "2024-01-02", "Tablet", "South", 1, 300.0, 60.0),
            record("ORD-3", "2024-02-10", "Laptop", "North", 1, 100.0, 40.0),
        ];

        let kpis = compute_kpis(&records).unwrap();
        assert_eq!(kpis.total_revenue, 600.0);
        assert_eq!(kpis.total_profit, 150.0);
        assert_eq!(kpis.total_orders, 3);
        assert_eq!(kpis.avg_order_value, 200.0);
        assert_eq!(kpis.profit_margin_pct, 25.0);
        assert_eq!(kpis.active_days, 2);
        assert_eq!(kpis.avg_orders_per_day, 1.5);
        assert_eq!(kpis.first_date.to_string(), "2024-01-02");
        assert_eq!(kpis.last_date.to_string(), "2024-02-10");
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let err = compute_kpis(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset { .. }));
    }

    #[test]
    fn zero_revenue_margin_is_an_error() {
        let records = vec![record("ORD-1", "2024-01-02", "Freebie", "North", 3, 0.0, 0.0)];
        let err = compute_kpis(&records).unwrap_err();
        assert!(matches!(err, AnalysisError::ZeroDenominator { .. }));
    }
}

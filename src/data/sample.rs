//! Synthetic sales dataset generation.
//!
//! Produces a deterministic (seeded) order book over a fixed product catalogue
//! and four sales regions. Used for demos, tests and the `generate` command.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::domain::SaleRecord;
use crate::error::AppError;

/// Product catalogue with list prices.
pub const PRODUCTS: [(&str, f64); 8] = [
    ("Laptop", 899.99),
    ("Smartphone", 699.99),
    ("Tablet", 499.99),
    ("Headphones", 149.99),
    ("Yoga Mat", 39.99),
    ("Dumbbells", 79.99),
    ("Blender", 89.99),
    ("Coffee Maker", 129.99),
];

pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// First order id number; ids are `ORD-{FIRST_ORDER_NUMBER + i}`.
const FIRST_ORDER_NUMBER: usize = 10_000;

/// Profit is drawn as a fraction of revenue from this range.
const PROFIT_MARGIN_RANGE: std::ops::Range<f64> = 0.2..0.4;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    pub start_date: NaiveDate,
    /// Orders fall on `start_date + 0..=span_days`.
    pub span_days: i64,
    pub max_quantity: u32,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 500,
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            span_days: 300,
            max_quantity: 5,
        }
    }
}

/// Generate `config.count` records, sorted by date.
///
/// Order ids are assigned in generation order, before the sort.
pub fn generate_sales(config: &SampleConfig) -> Result<Vec<SaleRecord>, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if config.span_days < 0 {
        return Err(AppError::new(2, "Date span must be >= 0 days."));
    }
    if config.max_quantity == 0 {
        return Err(AppError::new(2, "Maximum quantity must be >= 1."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut records = Vec::with_capacity(config.count);

    for i in 0..config.count {
        let (product, unit_price) = PRODUCTS[rng.gen_range(0..PRODUCTS.len())];
        let offset = rng.gen_range(0..=config.span_days);
        let date = config
            .start_date
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| AppError::new(2, "Sample date out of range."))?;
        let region = REGIONS[rng.gen_range(0..REGIONS.len())];
        let quantity = rng.gen_range(1..=config.max_quantity);

        let revenue = unit_price * f64::from(quantity);
        let profit = revenue * rng.gen_range(PROFIT_MARGIN_RANGE);

        records.push(SaleRecord {
            order_id: format!("ORD-{}", FIRST_ORDER_NUMBER + i),
            date,
            product: product.to_string(),
            region: region.to_string(),
            quantity,
            unit_price,
            revenue,
            profit,
        });
    }

    records.sort_by_key(|r| r.date);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revenue_and_profit_invariants_hold() {
        let records = generate_sales(&SampleConfig::default()).unwrap();
        assert_eq!(records.len(), 500);

        let revenue: f64 = records.iter().map(|r| r.revenue).sum();
        let expected: f64 = records.iter().map(|r| f64::from(r.quantity) * r.unit_price).sum();
        assert_eq!(revenue, expected);

        let profit: f64 = records.iter().map(|r| r.profit).sum();
        assert!(profit <= revenue);

        for r in &records {
            assert!((1..=5).contains(&r.quantity));
            assert!(r.profit >= 0.2 * r.revenue - 1e-9 && r.profit < 0.4 * r.revenue);
        }
    }

    #[test]
    fn records_are_sorted_and_within_span() {
        let config = SampleConfig::default();
        let records = generate_sales(&config).unwrap();
        let last = config.start_date + Duration::days(config.span_days);

        assert!(records.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(records.iter().all(|r| r.date >= config.start_date && r.date <= last));
    }

    #[test]
    fn same_seed_same_data() {
        let config = SampleConfig { count: 50, ..SampleConfig::default() };
        assert_eq!(generate_sales(&config).unwrap(), generate_sales(&config).unwrap());

        let other = SampleConfig { seed: 7, ..config.clone() };
        assert_ne!(generate_sales(&config).unwrap(), generate_sales(&other).unwrap());
    }

    #[test]
    fn order_ids_are_unique() {
        let records = generate_sales(&SampleConfig { count: 20, ..SampleConfig::default() }).unwrap();
        let mut ids: Vec<_> = records.iter().map(|r| r.order_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert!(ids.contains(&"ORD-10000"));
    }

    #[test]
    fn zero_count_is_rejected() {
        let err = generate_sales(&SampleConfig { count: 0, ..SampleConfig::default() }).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

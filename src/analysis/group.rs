//! Group-by reductions (sum / mean / count / top-k).
//!
//! Every grouping produces an ordered map from key to [`Totals`]; ranking
//! helpers sort with a stable sort, so ties keep key order.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::analysis::kpi::{profit_margin_pct, share_pct};
use crate::domain::SaleRecord;
use crate::error::AnalysisError;

/// Sums over one group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub revenue: f64,
    pub profit: f64,
    pub orders: usize,
}

impl Totals {
    fn add(&mut self, record: &SaleRecord) {
        self.revenue += record.revenue;
        self.profit += record.profit;
        self.orders += 1;
    }

    pub fn margin_pct(&self, context: &str) -> Result<f64, AnalysisError> {
        profit_margin_pct(self.profit, self.revenue, context)
    }

    /// Mean revenue per order (also the average order value).
    pub fn mean_revenue(&self, context: &str) -> Result<f64, AnalysisError> {
        if self.orders == 0 {
            return Err(AnalysisError::empty(context));
        }
        Ok(self.revenue / self.orders as f64)
    }
}

/// A group key with its totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K> {
    pub key: K,
    pub totals: Totals,
}

pub fn group_by<'a, K, F>(records: impl IntoIterator<Item = &'a SaleRecord>, key: F) -> BTreeMap<K, Totals>
where
    K: Ord,
    F: Fn(&SaleRecord) -> K,
{
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

fn into_groups<K>(map: BTreeMap<K, Totals>) -> Vec<Group<K>> {
    map.into_iter().map(|(key, totals)| Group { key, totals }).collect()
}

fn sort_desc_by<K>(groups: &mut [Group<K>], metric: impl Fn(&Totals) -> f64) {
    groups.sort_by(|a, b| {
        metric(&b.totals)
            .partial_cmp(&metric(&a.totals))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Revenue per region, highest first.
pub fn by_region(records: &[SaleRecord]) -> Vec<Group<String>> {
    let mut groups = into_groups(group_by(records, |r| r.region.clone()));
    sort_desc_by(&mut groups, |t| t.revenue);
    groups
}

/// Revenue per product, highest first.
pub fn by_product(records: &[SaleRecord]) -> Vec<Group<String>> {
    let mut groups = into_groups(group_by(records, |r| r.product.clone()));
    sort_desc_by(&mut groups, |t| t.revenue);
    groups
}

/// Profit per product, highest first.
pub fn product_profitability(records: &[SaleRecord]) -> Vec<Group<String>> {
    let mut groups = into_groups(group_by(records, |r| r.product.clone()));
    sort_desc_by(&mut groups, |t| t.profit);
    groups
}

/// Regions (revenue-descending) with their share of total revenue in percent.
pub fn region_shares(records: &[SaleRecord]) -> Result<Vec<(Group<String>, f64)>, AnalysisError> {
    let total: f64 = records.iter().map(|r| r.revenue).sum();
    by_region(records)
        .into_iter()
        .map(|g| {
            let pct = share_pct(g.totals.revenue, total, "regional revenue share")?;
            Ok((g, pct))
        })
        .collect()
}

/// Totals per calendar month number (1..=12), years merged.
pub fn by_calendar_month(records: &[SaleRecord]) -> Vec<Group<u32>> {
    into_groups(group_by(records, |r| r.date.month()))
}

/// Totals per quarter (1..=4).
pub fn by_quarter(records: &[SaleRecord]) -> Vec<Group<u32>> {
    into_groups(group_by(records, |r| r.date.month0() / 3 + 1))
}

/// Totals per weekday, keyed by days from Monday (0 = Monday).
pub fn by_weekday(records: &[SaleRecord]) -> Vec<Group<u32>> {
    into_groups(group_by(records, |r| r.date.weekday().num_days_from_monday()))
}

/// Distinct regions in order of first appearance.
pub fn regions_in_order(records: &[SaleRecord]) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for record in records {
        if !regions.iter().any(|r| r == &record.region) {
            regions.push(record.region.clone());
        }
    }
    regions
}

/// For each region (first-appearance order), its top `k` products by revenue.
pub fn top_products_per_region(records: &[SaleRecord], k: usize) -> Vec<(String, Vec<Group<String>>)> {
    regions_in_order(records)
        .into_iter()
        .map(|region| {
            let mut products = into_groups(group_by(records.iter().filter(|r| r.region == region), |r| {
                r.product.clone()
            }));
            sort_desc_by(&mut products, |t| t.revenue);
            products.truncate(k);
            (region, products)
        })
        .collect()
}

/// First group with the largest metric.
pub fn best_by<K>(groups: &[Group<K>], metric: impl Fn(&Totals) -> f64) -> Option<&Group<K>> {
    let mut best: Option<&Group<K>> = None;
    for g in groups {
        match best {
            Some(b) if metric(&g.totals) <= metric(&b.totals) => {}
            _ => best = Some(g),
        }
    }
    best
}

/// First group with the smallest metric.
pub fn worst_by<K>(groups: &[Group<K>], metric: impl Fn(&Totals) -> f64) -> Option<&Group<K>> {
    best_by(groups, |t| -metric(t))
}

/// First group with the highest profit margin, together with that margin.
pub fn highest_margin<K>(groups: &[Group<K>]) -> Result<Option<(&Group<K>, f64)>, AnalysisError> {
    let mut best: Option<(&Group<K>, f64)> = None;
    for g in groups {
        let margin = g.totals.margin_pct("product profit margin")?;
        match best {
            Some((_, m)) if margin <= m => {}
            _ => best = Some((g, margin)),
        }
    }
    Ok(best)
}

/// Whether group revenues are tightly clustered: sample standard deviation
/// below 20% of the mean. Fewer than two groups never counts as consistent.
pub fn regional_consistency(revenues: &[f64]) -> bool {
    let n = revenues.len();
    if n < 2 {
        return false;
    }
    let mean = revenues.iter().sum::<f64>() / n as f64;
    let var = revenues.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt() < mean * 0.2
}

pub fn month_name(month: u32) -> &'static str {
    crate::domain::YearMonth { year: 0, month }.month_name()
}

pub fn weekday_name(days_from_monday: u32) -> &'static str {
    match days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        6 => "Sunday",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_records::{record, sample};

    #[test]
    fn region_totals_sum_back_to_total_revenue() {
        let records = sample();
        let total: f64 = records.iter().map(|r| r.revenue).sum();
        let grouped: f64 = by_region(&records).iter().map(|g| g.totals.revenue).sum();
        assert!((total - grouped).abs() < 1e-6);

        let shares: f64 = region_shares(&records).unwrap().iter().map(|(_, p)| p).sum();
        assert!((shares - 100.0).abs() < 1e-9);
    }

    #[test]
    fn by_region_ranks_highest_first() {
        let records = vec![
            record("A", "2024-01-01", "Laptop", "North", 1, 100.0, 10.0),
            record("B", "2024-01-01", "Laptop", "South", 3, 100.0, 10.0),
            record("C", "2024-01-01", "Laptop", "East", 2, 100.0, 10.0),
        ];
        let keys: Vec<_> = by_region(&records).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, ["South", "East", "North"]);
    }

    #[test]
    fn ties_keep_key_order() {
        let records = vec![
            record("A", "2024-01-01", "Tablet", "West", 1, 50.0, 5.0),
            record("B", "2024-01-01", "Blender", "West", 1, 50.0, 5.0),
        ];
        let keys: Vec<_> = by_product(&records).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, ["Blender", "Tablet"]);
    }

    #[test]
    fn calendar_groupings() {
        let records = vec![
            // Monday
            record("A", "2024-01-01", "Laptop", "North", 1, 100.0, 10.0),
            // Wednesday, Q2
            record("B", "2024-04-03", "Laptop", "North", 1, 200.0, 10.0),
            // Monday, January again
            record("C", "2024-01-08", "Laptop", "North", 1, 300.0, 10.0),
        ];

        let months = by_calendar_month(&records);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].key, 1);
        assert_eq!(months[0].totals.revenue, 400.0);
        assert_eq!(months[0].totals.mean_revenue("m").unwrap(), 200.0);
        assert_eq!(month_name(months[1].key), "April");

        let quarters = by_quarter(&records);
        assert_eq!(quarters.iter().map(|g| g.key).collect::<Vec<_>>(), [1, 2]);

        let days = by_weekday(&records);
        assert_eq!(days[0].key, 0);
        assert_eq!(days[0].totals.orders, 2);
        assert_eq!(weekday_name(days[1].key), "Wednesday");
    }

    #[test]
    fn top_products_follow_first_appearance_of_regions() {
        let records = vec![
            record("A", "2024-01-01", "Tablet", "West", 1, 500.0, 5.0),
            record("B", "2024-01-01", "Laptop", "East", 1, 900.0, 5.0),
            record("C", "2024-01-02", "Laptop", "West", 1, 900.0, 5.0),
            record("D", "2024-01-02", "Blender", "West", 1, 90.0, 5.0),
        ];
        let top = top_products_per_region(&records, 2);
        assert_eq!(top[0].0, "West");
        assert_eq!(
            top[0].1.iter().map(|g| g.key.as_str()).collect::<Vec<_>>(),
            ["Laptop", "Tablet"]
        );
        assert_eq!(top[1].0, "East");
        assert_eq!(top[1].1.len(), 1);
    }

    #[test]
    fn best_and_worst_pick_first_extreme() {
        let groups = vec![
            Group { key: "a", totals: Totals { revenue: 5.0, profit: 1.0, orders: 1 } },
            Group { key: "b", totals: Totals { revenue: 7.0, profit: 1.0, orders: 1 } },
            Group { key: "c", totals: Totals { revenue: 7.0, profit: 3.0, orders: 1 } },
        ];
        assert_eq!(best_by(&groups, |t| t.revenue).unwrap().key, "b");
        assert_eq!(worst_by(&groups, |t| t.revenue).unwrap().key, "a");

        let (g, margin) = highest_margin(&groups).unwrap().unwrap();
        assert_eq!(g.key, "c");
        assert!((margin - 300.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn zero_revenue_group_margin_is_an_error() {
        let groups = vec![Group { key: "free", totals: Totals { revenue: 0.0, profit: 0.0, orders: 2 } }];
        assert!(matches!(
            highest_margin(&groups),
            Err(AnalysisError::ZeroDenominator { .. })
        ));
    }

    #[test]
    fn consistency_uses_sample_standard_deviation() {
        assert!(regional_consistency(&[100.0, 101.0, 99.0, 100.0]));
        assert!(!regional_consistency(&[100.0, 300.0]));
        assert!(!regional_consistency(&[100.0]));
    }
}

//! Monthly revenue forecasting.
//!
//! Workflow:
//! 1. Sum revenue per calendar month present in the data, in chronological
//!    order, and number those months `1..=N`.
//! 2. Fit `revenue ≈ slope * month_index + intercept` by least squares
//!    (see [`crate::math::ols`]).
//! 3. Extrapolate to `N+1..=N+HORIZON` and compare against the trailing
//!    `HORIZON` observed months.
//!
//! The same fit runs per region on that region's own months.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use nalgebra::DVector;
use tracing::debug;

use crate::analysis::regions_in_order;
use crate::domain::{Forecast, ForecastModel, ForecastPoint, MonthlyAggregate, RegionForecast, SaleRecord, YearMonth};
use crate::error::AnalysisError;
use crate::math::{fit_line, r_squared};

/// Number of months extrapolated past the last observed month.
pub const HORIZON: usize = 3;

/// Minimum number of observed months for a defined fit.
pub const MIN_MONTHS: usize = 2;

/// Forecast labels step this many days per month from the last order date.
const LABEL_STEP_DAYS: i64 = 30;

/// Total revenue per observed month, chronological, indexed from 1.
pub fn monthly_revenue<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Vec<MonthlyAggregate> {
    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for record in records {
        *by_month.entry(YearMonth::of(record.date)).or_insert(0.0) += record.revenue;
    }

    by_month
        .into_iter()
        .enumerate()
        .map(|(i, (year_month, total_revenue))| MonthlyAggregate {
            month_index: i + 1,
            year_month,
            total_revenue,
        })
        .collect()
}

/// Fit the monthly series; returns the model, in-sample predictions and R².
pub fn fit_months(
    months: &[MonthlyAggregate],
    context: &str,
) -> Result<(ForecastModel, Vec<f64>, f64), AnalysisError> {
    if months.len() < MIN_MONTHS {
        return Err(AnalysisError::insufficient(context, MIN_MONTHS, months.len()));
    }

    let x = DVector::from_iterator(months.len(), months.iter().map(|m| m.month_index as f64));
    let y = DVector::from_iterator(months.len(), months.iter().map(|m| m.total_revenue));

    // Distinct month indices always have non-zero variance; `None` here means
    // the revenue sums overflowed or were not finite.
    let line = fit_line(&x, &y).ok_or_else(|| AnalysisError::non_finite(context))?;
    let model = ForecastModel {
        slope: line.slope,
        intercept: line.intercept,
    };

    let fitted = x.map(|v| model.predict(v));
    let r2 = r_squared(&y, &fitted);
    debug!(context, slope = model.slope, intercept = model.intercept, r2, "fitted monthly trend");

    Ok((model, fitted.iter().copied().collect(), r2))
}

/// Percentage change of the forecast total against the trailing total.
pub fn growth_pct(forecast_total: f64, trailing_total: f64) -> Result<f64, AnalysisError> {
    if trailing_total == 0.0 {
        return Err(AnalysisError::zero_denominator("projected growth (trailing revenue is zero)"));
    }
    Ok((forecast_total - trailing_total) / trailing_total * 100.0)
}

/// Month labels (`"%B %Y"`) for the forecast horizon, stepping 30 days per
/// month from the last order date.
pub fn forecast_labels(last_order_date: NaiveDate, horizon: usize) -> Vec<String> {
    (1..=horizon)
        .map(|i| {
            let days = LABEL_STEP_DAYS * i as i64;
            last_order_date
                .checked_add_signed(Duration::days(days))
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| format!("month +{i}"))
        })
        .collect()
}

/// Fit and extrapolate an already aggregated monthly series.
pub fn forecast_months(months: Vec<MonthlyAggregate>, last_order_date: NaiveDate) -> Result<Forecast, AnalysisError> {
    let (model, fitted, r_squared) = fit_months(&months, "revenue forecast")?;

    let n = months.len();
    let points: Vec<ForecastPoint> = forecast_labels(last_order_date, HORIZON)
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let month_index = n + i + 1;
            ForecastPoint {
                month_index,
                label,
                revenue: model.predict(month_index as f64),
            }
        })
        .collect();

    let forecast_total: f64 = points.iter().map(|p| p.revenue).sum();
    let trailing_total: f64 = months.iter().rev().take(HORIZON).map(|m| m.total_revenue).sum();
    let growth_pct = growth_pct(forecast_total, trailing_total)?;

    Ok(Forecast {
        months,
        model,
        r_squared,
        fitted,
        points,
        forecast_total,
        trailing_total,
        growth_pct,
    })
}

/// Forecast total monthly revenue for the whole dataset.
pub fn forecast_revenue(records: &[SaleRecord]) -> Result<Forecast, AnalysisError> {
    let last_order_date = records
        .iter()
        .map(|r| r.date)
        .max()
        .ok_or_else(|| AnalysisError::empty("revenue forecast"))?;
    forecast_months(monthly_revenue(records), last_order_date)
}

/// Next-month prediction per region, in order of first appearance.
///
/// Each region is fitted on its own months; a region with fewer than
/// [`MIN_MONTHS`] months reports its own error without affecting the others.
pub fn forecast_by_region(records: &[SaleRecord]) -> Vec<RegionForecast> {
    regions_in_order(records)
        .into_iter()
        .map(|region| {
            let months = monthly_revenue(records.iter().filter(|r| r.region == region));
            let context = format!("{region} forecast");
            let outcome = fit_months(&months, &context).map(|(model, _, _)| model.predict((months.len() + 1) as f64));
            RegionForecast {
                months: months.len(),
                region,
                outcome,
            }
        })
        .collect()
}

// Top-N sale durations and per-model / per-category breakdowns.
use serde::Serialize;
use shared::models::Vehicle;
use std::cmp::Reverse;

use super::finite_or_zero;
use super::group_in_order;
use super::sales::days_to_sell;

pub const TOP_SALES_LIMIT: usize = 10;
pub const REVENUE_CHART_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaleDuration<'a> {
    pub vehicle: &'a Vehicle,
    pub days_to_sell: u32,
}

fn with_durations<'a>(sales: &[&'a Vehicle]) -> Vec<SaleDuration<'a>> {
    sales
        .iter()
        .map(|&v| SaleDuration {
            vehicle: v,
            days_to_sell: days_to_sell(v),
        })
        .collect()
}

/// Quickest sales first. Equal durations keep their input order.
pub fn fastest_sales<'a>(sales: &[&'a Vehicle], limit: usize) -> Vec<SaleDuration<'a>> {
    let mut ranked = with_durations(sales);
    ranked.sort_by_key(|s| s.days_to_sell);
    ranked.truncate(limit);
    ranked
}

/// Slowest sales first. Equal durations keep their input order.
pub fn slowest_sales<'a>(sales: &[&'a Vehicle], limit: usize) -> Vec<SaleDuration<'a>> {
    let mut ranked = with_durations(sales);
    ranked.sort_by_key(|s| Reverse(s.days_to_sell));
    ranked.truncate(limit);
    ranked
}

fn revenue_by<F>(sales: &[&Vehicle], key: F) -> Vec<(String, f64)>
where
    F: Fn(&Vehicle) -> String,
{
    let mut totals: Vec<(String, f64)> = group_in_order(sales, key)
        .into_iter()
        .map(|(label, vehicles)| {
            let revenue = vehicles.iter().map(|v| finite_or_zero(v.sale_price())).sum();
            (label, revenue)
        })
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

/// Revenue per "Brand Model", largest first, cut to `limit` entries.
pub fn revenue_by_model(sales: &[&Vehicle], limit: usize) -> Vec<(String, f64)> {
    let mut totals = revenue_by(sales, Vehicle::full_name);
    totals.truncate(limit);
    totals
}

pub fn revenue_by_category(sales: &[&Vehicle]) -> Vec<(String, f64)> {
    revenue_by(sales, |v| v.category.clone())
}

/// Distinct "Brand Model" names in order of first sale.
pub fn models_sold(sales: &[&Vehicle]) -> Vec<String> {
    group_in_order(sales, Vehicle::full_name)
        .into_iter()
        .map(|(model, _)| model)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStat {
    pub model: String,
    pub count: usize,
    pub total_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelHighlights {
    pub best_seller: ModelStat,
    pub highest_profit: ModelStat,
    pub lowest_profit: ModelStat,
    /// Whether the lowest-profit model actually lost money.
    pub lowest_is_loss: bool,
}

impl ModelHighlights {
    /// `None` for an empty set. Ties go to the model sold first.
    pub fn from_sales(sales: &[&Vehicle]) -> Option<Self> {
        let stats: Vec<ModelStat> = group_in_order(sales, Vehicle::full_name)
            .into_iter()
            .map(|(model, vehicles)| ModelStat {
                model,
                count: vehicles.len(),
                total_profit: vehicles.iter().map(|v| finite_or_zero(v.profit())).sum(),
            })
            .collect();

        let first = stats.first()?;
        let mut best_seller = first;
        let mut highest = first;
        let mut lowest = first;
        for stat in &stats[1..] {
            if stat.count > best_seller.count {
                best_seller = stat;
            }
            if stat.total_profit > highest.total_profit {
                highest = stat;
            }
            if stat.total_profit < lowest.total_profit {
                lowest = stat;
            }
        }

        Some(ModelHighlights {
            best_seller: best_seller.clone(),
            highest_profit: highest.clone(),
            lowest_profit: lowest.clone(),
            lowest_is_loss: lowest.total_profit < 0.0,
        })
    }
}

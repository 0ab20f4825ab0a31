// Stock-side view: dashboard KPIs over available vehicles and the stock filters.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Company, Vehicle, VehicleStatus};
use std::collections::BTreeSet;
use std::fmt;

use crate::metrics::dates::{days_in_stock, is_past_goal};
use crate::metrics::loss::total_loss;

pub const DEFAULT_OVERDUE_DAYS: u32 = 30;
pub const DEFAULT_NEW_ARRIVAL_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StockAgeRange {
    #[serde(rename = "0-15")]
    UpTo15,
    #[serde(rename = "16-30")]
    From16To30,
    #[serde(rename = "31-60")]
    From31To60,
    #[serde(rename = "60+")]
    Over60,
}

impl StockAgeRange {
    pub fn contains(&self, days: u32) -> bool {
        match self {
            StockAgeRange::UpTo15 => days <= 15,
            StockAgeRange::From16To30 => days > 15 && days <= 30,
            StockAgeRange::From31To60 => days > 30 && days <= 60,
            StockAgeRange::Over60 => days > 60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockAgeRange::UpTo15 => "0-15",
            StockAgeRange::From16To30 => "16-30",
            StockAgeRange::From31To60 => "31-60",
            StockAgeRange::Over60 => "60+",
        }
    }
}

impl fmt::Display for StockAgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for StockAgeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-15" => Ok(StockAgeRange::UpTo15),
            "16-30" => Ok(StockAgeRange::From16To30),
            "31-60" => Ok(StockAgeRange::From31To60),
            "60+" => Ok(StockAgeRange::Over60),
            _ => Err(format!("Unknown stock age range: {}", s)),
        }
    }
}

/// Buckets on the announced price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "0-50000")]
    UpTo50k,
    #[serde(rename = "50001-100000")]
    From50kTo100k,
    #[serde(rename = "100001-150000")]
    From100kTo150k,
    #[serde(rename = "150001+")]
    Over150k,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceRange::UpTo50k => price <= 50_000.0,
            PriceRange::From50kTo100k => price > 50_000.0 && price <= 100_000.0,
            PriceRange::From100kTo150k => price > 100_000.0 && price <= 150_000.0,
            PriceRange::Over150k => price > 150_000.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceRange::UpTo50k => "0-50000",
            PriceRange::From50kTo100k => "50001-100000",
            PriceRange::From100kTo150k => "100001-150000",
            PriceRange::Over150k => "150001+",
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-50000" => Ok(PriceRange::UpTo50k),
            "50001-100000" => Ok(PriceRange::From50kTo100k),
            "100001-150000" => Ok(PriceRange::From100kTo150k),
            "150001+" => Ok(PriceRange::Over150k),
            _ => Err(format!("Unknown price range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalespersonSelection {
    /// Vehicles nobody is responsible for yet.
    Unassigned,
    Member(String),
}

impl SalespersonSelection {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        match (self, vehicle.salesperson_id.as_deref()) {
            (SalespersonSelection::Unassigned, None) | (SalespersonSelection::Unassigned, Some("")) => true,
            (SalespersonSelection::Member(id), Some(assigned)) => id == assigned,
            _ => false,
        }
    }
}

impl std::str::FromStr for SalespersonSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("Empty salesperson id".to_string()),
            "unassigned" => Ok(SalespersonSelection::Unassigned),
            id => Ok(SalespersonSelection::Member(id.to_string())),
        }
    }
}

/// Stock list filters. Empty selections let everything through; within one
/// selection any entry may match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockFilter {
    pub salespeople: BTreeSet<SalespersonSelection>,
    /// Bare model names or "Brand Model" names.
    pub model_names: BTreeSet<String>,
    pub stock_ages: BTreeSet<StockAgeRange>,
    pub price_ranges: BTreeSet<PriceRange>,
    pub overdue_only: bool,
    pub overdue_days: u32,
    pub priority_only: bool,
}

impl Default for StockFilter {
    fn default() -> Self {
        StockFilter {
            salespeople: BTreeSet::new(),
            model_names: BTreeSet::new(),
            stock_ages: BTreeSet::new(),
            price_ranges: BTreeSet::new(),
            overdue_only: false,
            overdue_days: DEFAULT_OVERDUE_DAYS,
            priority_only: false,
        }
    }
}

impl StockFilter {
    pub fn matches(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> bool {
        let days = days_in_stock(vehicle.entry_date, now);

        if self.priority_only && !is_priority(vehicle, now) {
            return false;
        }
        if self.overdue_only && days <= self.overdue_days {
            return false;
        }
        if !self.salespeople.is_empty() && !self.salespeople.iter().any(|s| s.matches(vehicle)) {
            return false;
        }
        if !self.model_names.is_empty()
            && !self.model_names.contains(&vehicle.model)
            && !self.model_names.contains(&vehicle.full_name())
        {
            return false;
        }
        if !self.stock_ages.is_empty() && !self.stock_ages.iter().any(|r| r.contains(days)) {
            return false;
        }
        if !self.price_ranges.is_empty()
            && !self.price_ranges.iter().any(|r| r.contains(vehicle.announced_price))
        {
            return false;
        }
        true
    }

    /// Available vehicles passing every filter, in input order.
    pub fn apply<'a>(&self, vehicles: &'a [Vehicle], now: DateTime<Utc>) -> Vec<&'a Vehicle> {
        available(vehicles)
            .filter(|v| self.matches(v, now))
            .collect()
    }
}

pub fn available(vehicles: &[Vehicle]) -> impl Iterator<Item = &Vehicle> {
    vehicles.iter().filter(|v| v.status == VehicleStatus::Available)
}

/// Flagged by hand or already past its sale goal.
pub fn is_priority(vehicle: &Vehicle, now: DateTime<Utc>) -> bool {
    vehicle.is_priority || is_past_goal(vehicle.entry_date, vehicle.sale_goal_days, now)
}

pub fn priority_vehicles(vehicles: &[Vehicle], now: DateTime<Utc>) -> Vec<&Vehicle> {
    available(vehicles).filter(|v| is_priority(v, now)).collect()
}

/// Available vehicles that entered stock at most `days` ago.
pub fn new_arrivals(vehicles: &[Vehicle], now: DateTime<Utc>, days: u32) -> Vec<&Vehicle> {
    available(vehicles)
        .filter(|v| days_in_stock(v.entry_date, now) <= days)
        .collect()
}

/// Sale value of the available vehicles assigned to `salesperson_id`.
pub fn assigned_value(vehicles: &[Vehicle], salesperson_id: &str) -> f64 {
    available(vehicles)
        .filter(|v| v.salesperson_id.as_deref() == Some(salesperson_id))
        .map(|v| crate::metrics::finite_or_zero(v.sale_price()))
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub available: usize,
    pub priority: usize,
    pub overdue: usize,
    pub new_arrivals: usize,
    pub total_loss: f64,
    pub total_ad_budget: f64,
    pub total_stock_value: f64,
}

impl InventorySummary {
    pub fn compute(vehicles: &[Vehicle], now: DateTime<Utc>, overdue_days: u32, new_arrival_days: u32) -> Self {
        let mut summary = InventorySummary::default();
        for vehicle in available(vehicles) {
            let days = days_in_stock(vehicle.entry_date, now);
            summary.available += 1;
            if is_priority(vehicle, now) {
                summary.priority += 1;
            }
            if days > overdue_days {
                summary.overdue += 1;
            }
            if days <= new_arrival_days {
                summary.new_arrivals += 1;
            }
            summary.total_loss += total_loss(vehicle, now);
            summary.total_ad_budget += crate::metrics::finite_or_zero(vehicle.ad_cost);
            summary.total_stock_value += crate::metrics::finite_or_zero(vehicle.sale_price());
        }
        tracing::debug!(
            available = summary.available,
            priority = summary.priority,
            "Computed inventory summary"
        );
        summary
    }
}

/// Monthly ad budget against what the stock currently spends on ads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdBudget {
    pub monthly: f64,
    pub committed: f64,
    /// Negative when spending exceeds the budget.
    pub remaining: f64,
}

impl AdBudget {
    pub fn for_company(company: &Company, summary: &InventorySummary) -> Self {
        let monthly = company.monthly_ad_budget.unwrap_or(0.0);
        AdBudget {
            monthly,
            committed: summary.total_ad_budget,
            remaining: monthly - summary.total_ad_budget,
        }
    }

    pub fn is_over(&self) -> bool {
        self.remaining < 0.0
    }
}

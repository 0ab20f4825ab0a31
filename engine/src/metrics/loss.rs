// Holding-cost loss of vehicles sitting in stock.
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::Vehicle;

use super::dates::{days_in_stock, days_until, start_of_day};
use super::finite_or_zero;

/// How many days ahead of the IPVA due date a vehicle is flagged as due soon.
pub const IPVA_WARNING_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum IpvaStatus {
    Overdue,
    DueSoon { days: u32 },
    UpToDate,
}

/// Fixed daily cost plus ad spend. Maintenance is not part of it.
pub fn daily_loss(vehicle: &Vehicle) -> f64 {
    finite_or_zero(vehicle.daily_cost) + finite_or_zero(vehicle.ad_cost)
}

/// Loss accumulated from entry up to `as_of`, plus the IPVA cost once its due
/// date lies before `as_of`'s day.
///
/// The count always runs to `as_of`, even for sold vehicles. Use
/// [`loss_at_sale_or`] when the accrual should stop at the sale.
pub fn total_loss(vehicle: &Vehicle, as_of: DateTime<Utc>) -> f64 {
    let days = days_in_stock(vehicle.entry_date, as_of);
    let base = f64::from(days) * daily_loss(vehicle);
    base + overdue_ipva(vehicle, as_of)
}

pub fn loss_at_sale_or(vehicle: &Vehicle, now: DateTime<Utc>) -> f64 {
    let as_of = match vehicle.sale_date {
        Some(sold_at) if vehicle.is_sold() => sold_at,
        _ => now,
    };
    total_loss(vehicle, as_of)
}

/// The IPVA cost if it is overdue at `as_of`, otherwise 0.
pub fn overdue_ipva(vehicle: &Vehicle, as_of: DateTime<Utc>) -> f64 {
    match (vehicle.ipva_cost, vehicle.ipva_due_date) {
        (Some(cost), Some(due)) if cost != 0.0 && due < start_of_day(as_of) => finite_or_zero(cost),
        _ => 0.0,
    }
}

pub fn ipva_status(vehicle: &Vehicle, now: DateTime<Utc>, warning_days: u32) -> Option<IpvaStatus> {
    let due = vehicle.ipva_due_date?;
    match vehicle.ipva_cost {
        Some(cost) if cost != 0.0 => {}
        _ => return None,
    }

    let days = days_until(due, now);
    Some(if days < 0 {
        IpvaStatus::Overdue
    } else if days <= i64::from(warning_days) {
        IpvaStatus::DueSoon { days: days as u32 }
    } else {
        IpvaStatus::UpToDate
    })
}

// Monthly sales-goal gauge and the per-vehicle sale deadline bar.
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use shared::models::{Company, TeamMember, Vehicle};

use super::dates::days_remaining;
use super::finite_or_zero;

const NEEDLE_MIN: f64 = -90.0;
const NEEDLE_SWEEP: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeBand {
    Red,
    Yellow,
    Green,
}

/// Sales made this month against a monthly goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesGoalGauge {
    pub current: u32,
    pub goal: u32,
}

impl SalesGoalGauge {
    pub fn new(current: u32, goal: u32) -> Self {
        Self { current, goal }
    }

    pub fn for_salesperson(member: &TeamMember, vehicles: &[Vehicle], now: DateTime<Utc>) -> Self {
        let sold = sold_in_month(vehicles, Some(&member.id), now);
        Self::new(count_u32(sold), member.monthly_sales_goal)
    }

    pub fn for_company(company: &Company, vehicles: &[Vehicle], now: DateTime<Utc>) -> Self {
        let sold = sold_in_month(vehicles, None, now);
        Self::new(count_u32(sold), company.monthly_sales_goal)
    }

    /// Share of the goal reached. Not capped; 0 when there is no goal.
    pub fn percentage(&self) -> f64 {
        if self.goal == 0 {
            return 0.0;
        }
        finite_or_zero(f64::from(self.current) / f64::from(self.goal) * 100.0)
    }

    /// Needle position in degrees, from -90 (nothing sold) to 90 (goal met).
    pub fn needle_angle(&self) -> f64 {
        NEEDLE_MIN + self.percentage().min(100.0) * NEEDLE_SWEEP / 100.0
    }

    /// Half the goal rounded up, the label at the top of the arc.
    pub fn mid_goal(&self) -> u32 {
        self.goal / 2 + self.goal % 2
    }

    /// Which third of the arc the needle sits in.
    pub fn band(&self) -> GaugeBand {
        let angle = self.needle_angle();
        if angle < -30.0 {
            GaugeBand::Red
        } else if angle < 30.0 {
            GaugeBand::Yellow
        } else {
            GaugeBand::Green
        }
    }

    pub fn goal_met(&self) -> bool {
        self.goal > 0 && self.current >= self.goal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    Green,
    Yellow,
    Red,
}

/// Time left before a vehicle misses its sale goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadlineProgress {
    pub days_left: u32,
    pub goal_days: u32,
}

impl DeadlineProgress {
    /// Sold vehicles are measured at their sale date.
    pub fn for_vehicle(vehicle: &Vehicle, now: DateTime<Utc>) -> Self {
        let reference = vehicle.sale_date.unwrap_or(now);
        Self {
            days_left: days_remaining(vehicle.entry_date, vehicle.sale_goal_days, reference),
            goal_days: vehicle.sale_goal_days,
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.goal_days == 0 {
            return 0.0;
        }
        (f64::from(self.days_left) / f64::from(self.goal_days) * 100.0).clamp(0.0, 100.0)
    }

    pub fn band(&self) -> ProgressBand {
        let pct = self.percentage();
        if pct > 50.0 {
            ProgressBand::Green
        } else if pct > 25.0 {
            ProgressBand::Yellow
        } else {
            ProgressBand::Red
        }
    }
}

/// Vehicles sold in the calendar month of `now`, optionally for one salesperson.
pub fn sold_in_month(vehicles: &[Vehicle], salesperson: Option<&str>, now: DateTime<Utc>) -> usize {
    vehicles
        .iter()
        .filter(|v| v.is_sold())
        .filter(|v| {
            v.sale_date
                .map_or(false, |at| at.year() == now.year() && at.month() == now.month())
        })
        .filter(|v| salesperson.map_or(true, |id| v.salesperson_id.as_deref() == Some(id)))
        .count()
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

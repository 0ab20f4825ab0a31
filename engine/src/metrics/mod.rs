// Stock and sales metrics. Every function here is pure: callers pass the
// vehicles and the instant they consider "now".
pub mod dates;
pub mod goals;
pub mod leaderboard;
pub mod loss;
pub mod rankings;
pub mod sales;

use shared::models::Vehicle;
use std::collections::HashMap;

pub use dates::{days_in_stock, days_remaining, is_past_goal, stock_age, Clock, FixedClock, SystemClock};
pub use loss::{daily_loss, total_loss};
pub use sales::{percent_change, DateWindow, PeriodComparison, SalesFilter, SalesMetrics};

/// NaN and infinities count as zero so one bad record cannot poison a sum.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Groups vehicles by `key`, keeping groups in order of first appearance.
pub(crate) fn group_in_order<'a, F>(vehicles: &[&'a Vehicle], key: F) -> Vec<(String, Vec<&'a Vehicle>)>
where
    F: Fn(&Vehicle) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a Vehicle>)> = Vec::new();
    for &vehicle in vehicles {
        let k = key(vehicle);
        match index.get(&k) {
            Some(&pos) => groups[pos].1.push(vehicle),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![vehicle]));
            }
        }
    }
    groups
}

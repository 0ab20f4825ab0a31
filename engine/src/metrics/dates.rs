// Day counts between instants. Nothing in here reads the system clock; the
// current instant always comes in as an argument or through a `Clock`.
use chrono::{DateTime, Duration, NaiveTime, Utc};
use shared::models::Vehicle;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant, for reports "as of" a date and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Whole days from `entry` to `reference`, truncated, never negative.
pub fn days_in_stock(entry: DateTime<Utc>, reference: DateTime<Utc>) -> u32 {
    let elapsed = (reference - entry).num_milliseconds();
    clamp_days(elapsed.div_euclid(MS_PER_DAY))
}

/// Stock age of a vehicle: frozen at the sale date once sold, otherwise
/// counted up to `now`.
pub fn stock_age(vehicle: &Vehicle, now: DateTime<Utc>) -> u32 {
    days_in_stock(vehicle.entry_date, vehicle.sale_date.unwrap_or(now))
}

/// Days left before the sale goal deadline, rounded up. Zero once the deadline
/// has passed; use [`is_past_goal`] to tell "due today" from "overdue".
pub fn days_remaining(entry: DateTime<Utc>, goal_days: u32, now: DateTime<Utc>) -> u32 {
    let Some(deadline) = entry.checked_add_signed(Duration::days(i64::from(goal_days))) else {
        return u32::MAX;
    };
    let left = (deadline - now).num_milliseconds();
    if left <= 0 {
        return 0;
    }
    clamp_days(ceil_days(left))
}

pub fn is_past_goal(entry: DateTime<Utc>, goal_days: u32, now: DateTime<Utc>) -> bool {
    days_in_stock(entry, now) > goal_days
}

/// Midnight UTC of the day `now` falls in.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(now.date_naive().and_time(NaiveTime::MIN), Utc)
}

/// Signed day distance from today's midnight to `target`, rounded up.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_days((target - start_of_day(now)).num_milliseconds())
}

fn ceil_days(ms: i64) -> i64 {
    -(-ms).div_euclid(MS_PER_DAY)
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_days_in_stock_truncates() {
        assert_eq!(days_in_stock(at(2024, 1, 1, 10), at(2024, 1, 11, 9)), 9);
        assert_eq!(days_in_stock(at(2024, 1, 1, 10), at(2024, 1, 11, 10)), 10);
        assert_eq!(days_in_stock(at(2024, 1, 1, 23), at(2024, 1, 2, 1)), 0);
    }

    #[test]
    fn test_days_in_stock_same_instant_is_zero() {
        let d = at(2024, 3, 15, 8);
        assert_eq!(days_in_stock(d, d), 0);
    }

    #[test]
    fn test_days_in_stock_never_negative() {
        assert_eq!(days_in_stock(at(2024, 5, 1, 0), at(2024, 4, 1, 0)), 0);
        assert_eq!(days_in_stock(at(2024, 5, 1, 12), at(2024, 5, 1, 11)), 0);
    }

    #[test]
    fn test_stock_age_freezes_at_sale() {
        let mut v = Vehicle::intake("c1", "Fiat", "Mobi", at(2024, 1, 1, 0));
        let now = at(2024, 3, 1, 0);
        assert_eq!(stock_age(&v, now), 60);
        v.mark_sold(at(2024, 1, 21, 0), None).unwrap();
        assert_eq!(stock_age(&v, now), 20);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let entry = at(2024, 1, 1, 12);
        assert_eq!(days_remaining(entry, 30, at(2024, 1, 1, 12)), 30);
        assert_eq!(days_remaining(entry, 30, at(2024, 1, 2, 0)), 30);
        assert_eq!(days_remaining(entry, 30, at(2024, 1, 30, 13)), 1);
    }

    #[test]
    fn test_days_remaining_zero_after_deadline() {
        let entry = at(2024, 1, 1, 0);
        assert_eq!(days_remaining(entry, 10, at(2024, 1, 11, 0)), 0);
        assert_eq!(days_remaining(entry, 10, at(2024, 3, 1, 0)), 0);
        assert!(!is_past_goal(entry, 10, at(2024, 1, 11, 0)));
        assert!(is_past_goal(entry, 10, at(2024, 1, 12, 0)));
    }

    #[test]
    fn test_days_remaining_saturates_on_huge_goal() {
        let entry = at(2024, 1, 1, 0);
        assert_eq!(days_remaining(entry, 200_000_000, at(2024, 1, 2, 0)), u32::MAX);
        assert!(!is_past_goal(entry, u32::MAX, at(2024, 1, 2, 0)));
    }

    #[test]
    fn test_days_until_is_signed() {
        let now = at(2024, 6, 10, 15);
        assert_eq!(days_until(at(2024, 6, 12, 0), now), 2);
        assert_eq!(days_until(at(2024, 6, 10, 0), now), 0);
        assert_eq!(days_until(at(2024, 6, 8, 0), now), -2);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(at(2024, 2, 29, 0));
        assert_eq!(clock.now(), at(2024, 2, 29, 0));
    }
}

// Reporting period presets and the date windows they cover.
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Vehicle;
use std::fmt;

use crate::metrics::{DateWindow, PeriodComparison, SalesFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    ThisMonth,
    Last30Days,
    LastMonth,
    #[default]
    Last90Days,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Last30Days,
        Period::ThisMonth,
        Period::LastMonth,
        Period::Last90Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Period::ThisMonth => "Este Mês",
            Period::Last30Days => "Últimos 30 dias",
            Period::LastMonth => "Mês Passado",
            Period::Last90Days => "Últimos 90 dias",
        }
    }

    /// Current and comparison windows for `now`, on whole UTC days.
    ///
    /// Rolling presets end today and compare against the equally long stretch
    /// before them. Calendar presets compare against the calendar month before.
    pub fn windows(&self, now: DateTime<Utc>) -> PeriodWindows {
        let today = now.date_naive();
        match self {
            Period::ThisMonth => {
                let (first, _) = month_bounds(today);
                let (prev_first, prev_last) = month_bounds(day_before(first));
                PeriodWindows {
                    current: DateWindow::whole_days(first, today),
                    previous: DateWindow::whole_days(prev_first, prev_last),
                }
            }
            Period::LastMonth => {
                let (first, _) = month_bounds(today);
                let (last_first, last_last) = month_bounds(day_before(first));
                let (prev_first, prev_last) = month_bounds(day_before(last_first));
                PeriodWindows {
                    current: DateWindow::whole_days(last_first, last_last),
                    previous: DateWindow::whole_days(prev_first, prev_last),
                }
            }
            Period::Last30Days => rolling(today, 30),
            Period::Last90Days => rolling(today, 90),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::ThisMonth => "this-month",
            Period::Last30Days => "last-30-days",
            Period::LastMonth => "last-month",
            Period::Last90Days => "last-90-days",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    /// Accepts kebab-case or snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "this-month" => Ok(Period::ThisMonth),
            "last-30-days" => Ok(Period::Last30Days),
            "last-month" => Ok(Period::LastMonth),
            "last-90-days" => Ok(Period::Last90Days),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindows {
    pub current: DateWindow,
    pub previous: DateWindow,
}

impl PeriodWindows {
    pub fn comparison(&self, vehicles: &[Vehicle], filter: &SalesFilter) -> PeriodComparison {
        PeriodComparison::between(vehicles, self.current, self.previous, filter)
    }
}

fn rolling(today: NaiveDate, days: i64) -> PeriodWindows {
    let first = today - Duration::days(days - 1);
    let current = DateWindow::whole_days(first, today);
    PeriodWindows {
        current,
        previous: current.preceding(),
    }
}

/// First and last day of the month `day` falls in.
fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(day);
    (first, last)
}

fn day_before(day: NaiveDate) -> NaiveDate {
    day.pred_opt().unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 45, 0).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn last_ms(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        midnight(y, m, d) + Duration::days(1) - Duration::milliseconds(1)
    }

    #[test]
    fn test_this_month_windows() {
        let w = Period::ThisMonth.windows(now());
        assert_eq!(w.current.start, midnight(2024, 3, 1));
        assert_eq!(w.current.end, last_ms(2024, 3, 15));
        assert_eq!(w.previous.start, midnight(2024, 2, 1));
        assert_eq!(w.previous.end, last_ms(2024, 2, 29));
    }

    #[test]
    fn test_last_month_windows_cross_year() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let w = Period::LastMonth.windows(jan);
        assert_eq!(w.current.start, midnight(2023, 12, 1));
        assert_eq!(w.current.end, last_ms(2023, 12, 31));
        assert_eq!(w.previous.start, midnight(2023, 11, 1));
        assert_eq!(w.previous.end, last_ms(2023, 11, 30));
    }

    #[test]
    fn test_rolling_windows() {
        let w = Period::Last30Days.windows(now());
        assert_eq!(w.current.start, midnight(2024, 2, 15));
        assert_eq!(w.current.end, last_ms(2024, 3, 15));
        assert_eq!(w.previous.end, last_ms(2024, 2, 14));
        assert_eq!(w.previous.start, midnight(2024, 1, 16));

        let w = Period::Last90Days.windows(now());
        assert_eq!(w.current.start, midnight(2023, 12, 17));
        assert_eq!(w.previous.length(), w.current.length());
    }

    #[test]
    fn test_parse_and_display() {
        for period in Period::ALL {
            assert_eq!(period.to_string().parse::<Period>(), Ok(period));
        }
        assert_eq!("last_90_days".parse::<Period>(), Ok(Period::Last90Days));
        assert_eq!("This-Month".parse::<Period>(), Ok(Period::ThisMonth));
        assert!("yesterday".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::Last90Days);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Period::LastMonth).unwrap();
        assert_eq!(json, "\"last_month\"");
        let back: Period = serde_json::from_str("\"this_month\"").unwrap();
        assert_eq!(back, Period::ThisMonth);
    }

    #[test]
    fn test_comparison_uses_both_windows() {
        let mut sold = Vehicle::intake("c1", "Jeep", "Renegade", midnight(2024, 1, 20));
        sold.announced_price = 90000.0;
        sold.mark_sold(midnight(2024, 2, 10), None).unwrap();
        let mut recent = Vehicle::intake("c1", "Jeep", "Compass", midnight(2024, 2, 20));
        recent.announced_price = 150000.0;
        recent.mark_sold(midnight(2024, 3, 5), None).unwrap();
        let vehicles = vec![sold, recent];

        let cmp = Period::ThisMonth
            .windows(now())
            .comparison(&vehicles, &SalesFilter::default());
        assert_eq!(cmp.current.total_sales, 1);
        assert_eq!(cmp.previous.total_sales, 1);
        assert_eq!(cmp.deltas.total_sales, 0.0);
    }
}

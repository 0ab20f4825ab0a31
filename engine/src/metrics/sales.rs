// Period aggregation of sold vehicles: filtering by sale date window and
// attributes, the KPI set, and period-over-period comparison.
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Vehicle;
use std::collections::BTreeSet;

use super::dates::days_in_stock;
use super::finite_or_zero;

/// Inclusive `[start, end]` range of sale instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// From midnight of `first` to the last millisecond of `last`.
    pub fn whole_days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = DateTime::from_naive_utc_and_offset(first.and_time(NaiveTime::MIN), Utc);
        let end = DateTime::from_naive_utc_and_offset(last.and_time(NaiveTime::MIN), Utc)
            + Duration::days(1)
            - Duration::milliseconds(1);
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// The window of the same length that ends right before this one starts.
    pub fn preceding(&self) -> Self {
        let end = self.start - Duration::milliseconds(1);
        Self {
            start: end - self.length(),
            end,
        }
    }
}

/// Optional attribute filters. Each one narrows the set independently, so the
/// order they are applied in never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilter {
    pub salesperson_id: Option<String>,
    pub category: Option<String>,
    /// "Brand Model" names; empty means every model.
    #[serde(default)]
    pub models: BTreeSet<String>,
}

impl SalesFilter {
    pub fn with_salesperson(mut self, id: impl Into<String>) -> Self {
        self.salesperson_id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_model(mut self, full_name: impl Into<String>) -> Self {
        self.models.insert(full_name.into());
        self
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        let salesperson_ok = self
            .salesperson_id
            .as_deref()
            .map_or(true, |id| vehicle.salesperson_id.as_deref() == Some(id));
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |category| vehicle.category == category);
        let model_ok = self.models.is_empty() || self.models.contains(&vehicle.full_name());
        salesperson_ok && category_ok && model_ok
    }
}

/// Sold vehicles whose sale date falls inside `window` and that pass `filter`,
/// in their original order.
pub fn sold_in_window<'a>(
    vehicles: &'a [Vehicle],
    window: &DateWindow,
    filter: &SalesFilter,
) -> Vec<&'a Vehicle> {
    vehicles
        .iter()
        .filter(|v| v.is_sold())
        .filter(|v| v.sale_date.map_or(false, |sold_at| window.contains(sold_at)))
        .filter(|v| filter.matches(v))
        .collect()
}

/// Days between entry and sale; 0 for a vehicle without a sale date.
pub fn days_to_sell(vehicle: &Vehicle) -> u32 {
    vehicle
        .sale_date
        .map_or(0, |sold_at| days_in_stock(vehicle.entry_date, sold_at))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub total_sales: usize,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub average_profit: f64,
    pub average_days_to_sell: f64,
}

impl SalesMetrics {
    pub fn from_vehicles<'a, I>(vehicles: I) -> Self
    where
        I: IntoIterator<Item = &'a Vehicle>,
    {
        let mut metrics = SalesMetrics::default();
        let mut total_days: u64 = 0;

        for vehicle in vehicles {
            metrics.total_sales += 1;
            metrics.total_revenue += finite_or_zero(vehicle.sale_price());
            metrics.total_profit += finite_or_zero(vehicle.profit());
            total_days += u64::from(days_to_sell(vehicle));
        }

        if metrics.total_sales > 0 {
            let count = metrics.total_sales as f64;
            metrics.average_profit = metrics.total_profit / count;
            metrics.average_days_to_sell = total_days as f64 / count;
        }
        metrics
    }
}

/// Percentage change from `previous` to `current`.
///
/// A zero baseline reads as +100 when something appeared and 0 when nothing
/// did; dropping to zero from a positive baseline is -100.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    if current == 0.0 && previous > 0.0 {
        return -100.0;
    }
    finite_or_zero((current - previous) / previous * 100.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub total_sales: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub average_profit: f64,
    pub average_days_to_sell: f64,
}

impl MetricDeltas {
    pub fn between(current: &SalesMetrics, previous: &SalesMetrics) -> Self {
        Self {
            total_sales: percent_change(current.total_sales as f64, previous.total_sales as f64),
            total_revenue: percent_change(current.total_revenue, previous.total_revenue),
            total_profit: percent_change(current.total_profit, previous.total_profit),
            average_profit: percent_change(current.average_profit, previous.average_profit),
            average_days_to_sell: percent_change(
                current.average_days_to_sell,
                previous.average_days_to_sell,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current_window: DateWindow,
    pub previous_window: DateWindow,
    pub current: SalesMetrics,
    pub previous: SalesMetrics,
    pub deltas: MetricDeltas,
}

impl PeriodComparison {
    /// Compares `window` against the equally long window right before it.
    pub fn compute(vehicles: &[Vehicle], window: DateWindow, filter: &SalesFilter) -> Self {
        Self::between(vehicles, window, window.preceding(), filter)
    }

    pub fn between(
        vehicles: &[Vehicle],
        current_window: DateWindow,
        previous_window: DateWindow,
        filter: &SalesFilter,
    ) -> Self {
        let current = SalesMetrics::from_vehicles(sold_in_window(vehicles, &current_window, filter));
        let previous =
            SalesMetrics::from_vehicles(sold_in_window(vehicles, &previous_window, filter));
        tracing::debug!(
            current_sales = current.total_sales,
            previous_sales = previous.total_sales,
            "Computed period comparison"
        );
        Self {
            current_window,
            previous_window,
            current,
            previous,
            deltas: MetricDeltas::between(&current, &previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 12, 0, 0).unwrap()
    }

    fn sold(model: &str, price: f64, purchase: f64, entry: DateTime<Utc>, sale: DateTime<Utc>) -> Vehicle {
        let mut v = Vehicle::intake("c1", "Toyota", model, entry);
        v.category = "SUV".into();
        v.announced_price = price;
        v.purchase_price = purchase;
        v.mark_sold(sale, Some("sp1".into())).unwrap();
        v
    }

    fn june() -> DateWindow {
        DateWindow::whole_days(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    #[test]
    fn test_window_is_inclusive() {
        let w = june();
        assert!(w.contains(w.start));
        assert!(w.contains(w.end));
        assert!(!w.contains(w.end + Duration::milliseconds(1)));
        assert!(!w.contains(w.start - Duration::milliseconds(1)));
    }

    #[test]
    fn test_preceding_window_has_same_length() {
        let w = june();
        let prev = w.preceding();
        assert_eq!(prev.length(), w.length());
        assert_eq!(prev.end + Duration::milliseconds(1), w.start);
        assert_eq!(prev.start, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let metrics = SalesMetrics::from_vehicles(Vec::<&Vehicle>::new());
        assert_eq!(metrics, SalesMetrics::default());
        assert_eq!(metrics.average_profit, 0.0);
        assert_eq!(metrics.average_days_to_sell, 0.0);
    }

    #[test]
    fn test_two_sales_metrics() {
        let vehicles = vec![
            sold("Corolla", 50000.0, 40000.0, day(5, 20), day(6, 4)),
            sold("Hilux", 70000.0, 55000.0, day(5, 1), day(6, 10)),
        ];
        let in_june = sold_in_window(&vehicles, &june(), &SalesFilter::default());
        let metrics = SalesMetrics::from_vehicles(in_june);
        assert_eq!(metrics.total_sales, 2);
        assert_eq!(metrics.total_revenue, 120000.0);
        assert_eq!(metrics.total_profit, 25000.0);
        assert_eq!(metrics.average_profit, 12500.0);
        assert_eq!(metrics.average_days_to_sell, (15.0 + 40.0) / 2.0);
    }

    #[test]
    fn test_negative_profit_counts() {
        let mut v = sold("Yaris", 60000.0, 58000.0, day(6, 1), day(6, 2));
        v.discount = 1000.0;
        v.add_maintenance("Motor", 3500.0, day(6, 1));
        let metrics = SalesMetrics::from_vehicles([&v]);
        assert_eq!(metrics.total_revenue, 59000.0);
        assert_eq!(metrics.total_profit, -2500.0);
    }

    #[test]
    fn test_unsold_and_out_of_window_are_excluded() {
        let mut vehicles = vec![
            sold("Corolla", 50000.0, 40000.0, day(5, 1), day(6, 4)),
            sold("Corolla", 50000.0, 40000.0, day(4, 1), day(5, 4)),
        ];
        vehicles.push(Vehicle::intake("c1", "Toyota", "Etios", day(6, 1)));
        let in_june = sold_in_window(&vehicles, &june(), &SalesFilter::default());
        assert_eq!(in_june.len(), 1);
        assert_eq!(in_june[0].sale_date, Some(day(6, 4)));
    }

    #[test]
    fn test_filters_commute() {
        let mut a = sold("Corolla", 50000.0, 40000.0, day(5, 1), day(6, 4));
        a.salesperson_id = Some("sp2".into());
        let mut b = sold("Hilux", 70000.0, 55000.0, day(5, 1), day(6, 5));
        b.category = "Pickup".into();
        let c = sold("Corolla", 52000.0, 41000.0, day(5, 1), day(6, 6));
        let vehicles = vec![a, b, c];

        let by_person = SalesFilter::default().with_salesperson("sp1");
        let by_model = SalesFilter::default().with_model("Toyota Corolla");
        let both = SalesFilter::default()
            .with_model("Toyota Corolla")
            .with_salesperson("sp1")
            .with_category("SUV");

        let person_then_model: Vec<&Vehicle> = sold_in_window(&vehicles, &june(), &by_person)
            .into_iter()
            .filter(|v| by_model.matches(v))
            .collect();
        let model_then_person: Vec<&Vehicle> = sold_in_window(&vehicles, &june(), &by_model)
            .into_iter()
            .filter(|v| by_person.matches(v))
            .collect();
        let combined = sold_in_window(&vehicles, &june(), &both);

        assert_eq!(person_then_model, model_then_person);
        assert_eq!(combined, person_then_model);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].announced_price, 52000.0);
    }

    #[test]
    fn test_percent_change_policy() {
        assert_eq!(percent_change(10.0, 0.0), 100.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 10.0), -100.0);
        assert_eq!(percent_change(15.0, 10.0), 50.0);
        assert_eq!(percent_change(5.0, 10.0), -50.0);
        assert_eq!(percent_change(-5.0, 0.0), 0.0);
    }

    #[test]
    fn test_period_comparison() {
        let vehicles = vec![
            sold("Corolla", 50000.0, 40000.0, day(4, 20), day(5, 15)),
            sold("Corolla", 50000.0, 40000.0, day(5, 20), day(6, 4)),
            sold("Hilux", 70000.0, 55000.0, day(5, 1), day(6, 10)),
        ];
        let cmp = PeriodComparison::compute(&vehicles, june(), &SalesFilter::default());
        assert_eq!(cmp.current.total_sales, 2);
        assert_eq!(cmp.previous.total_sales, 1);
        assert_eq!(cmp.deltas.total_sales, 100.0);
        assert_eq!(cmp.deltas.total_revenue, 140.0);
        assert_eq!(cmp.deltas.total_profit, 150.0);
    }
}

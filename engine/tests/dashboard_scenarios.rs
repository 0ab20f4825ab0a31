use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::models::{Vehicle, VehicleStatus};
use shared::utils::brazilian_format::{format_currency, parse_currency};
use std::io::Write;
use tempfile::Builder;

use stock_engine::config::ReportSettings;
use stock_engine::data::{load_vehicles, VehicleStore};
use stock_engine::metrics::leaderboard::Leaderboard;
use stock_engine::metrics::sales::sold_in_window;
use stock_engine::metrics::{
    daily_loss, days_in_stock, percent_change, total_loss, DateWindow, SalesFilter, SalesMetrics,
};
use stock_engine::periods::Period;
use stock_engine::report::{DashboardReport, ReportRequest};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn sale(salesperson: &str, profit: f64, sold_days_ago: i64) -> Vehicle {
    let sold_at = now() - Duration::days(sold_days_ago);
    let mut v = Vehicle::intake("c1", "Chevrolet", "Tracker", sold_at - Duration::days(12));
    v.purchase_price = 100000.0;
    v.announced_price = 100000.0 + profit;
    v.mark_sold(sold_at, Some(salesperson.into())).unwrap();
    v
}

#[test]
fn vehicle_in_stock_for_45_days_accumulates_1350() {
    let mut v = Vehicle::intake("c1", "Chevrolet", "Onix", now() - Duration::days(45));
    v.daily_cost = 20.0;
    v.ad_cost = 10.0;
    assert_eq!(days_in_stock(v.entry_date, now()), 45);
    assert_eq!(daily_loss(&v), 30.0);
    assert_eq!(total_loss(&v, now()), 1350.0);
}

#[test]
fn two_sales_in_june_aggregate() {
    let mut corolla = Vehicle::intake("c1", "Toyota", "Corolla", now() - Duration::days(30));
    corolla.announced_price = 50000.0;
    corolla.purchase_price = 40000.0;
    corolla.mark_sold(now() - Duration::days(5), None).unwrap();
    let mut hilux = Vehicle::intake("c1", "Toyota", "Hilux", now() - Duration::days(60));
    hilux.announced_price = 70000.0;
    hilux.purchase_price = 55000.0;
    hilux.mark_sold(now() - Duration::days(2), None).unwrap();
    let vehicles = vec![corolla, hilux];

    let june = DateWindow::whole_days(
        chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    );
    let metrics = SalesMetrics::from_vehicles(sold_in_window(&vehicles, &june, &SalesFilter::default()));
    assert_eq!(metrics.total_sales, 2);
    assert_eq!(metrics.total_revenue, 120000.0);
    assert_eq!(metrics.total_profit, 25000.0);
    assert_eq!(metrics.average_profit, 12500.0);
}

#[test]
fn leaderboard_breaks_sales_ties_on_profit() {
    let mut vehicles = Vec::new();
    for _ in 0..5 {
        vehicles.push(sale("ana", 2000.0, 3));
    }
    for _ in 0..3 {
        vehicles.push(sale("bruno", 3000.0, 4));
    }
    for _ in 0..5 {
        vehicles.push(sale("carla", 2400.0, 5));
    }
    let refs: Vec<&Vehicle> = vehicles.iter().collect();

    let board = Leaderboard::build(&refs);
    let summary: Vec<(usize, f64)> = board
        .entries
        .iter()
        .map(|e| (e.metrics.total_sales, e.metrics.total_profit))
        .collect();
    assert_eq!(summary, vec![(5, 12000.0), (5, 10000.0), (3, 9000.0)]);
}

#[test]
fn percent_change_policy() {
    assert_eq!(percent_change(10.0, 0.0), 100.0);
    assert_eq!(percent_change(0.0, 0.0), 0.0);
    assert_eq!(percent_change(0.0, 10.0), -100.0);
    assert_eq!(percent_change(15.0, 10.0), 50.0);
}

#[test]
fn currency_round_trip_and_garbage() {
    for value in [0.0, 0.01, 999.99, 1234.56, 600822115.84] {
        let back = parse_currency(&format_currency(value));
        assert!((back - value).abs() < 0.005, "{} came back as {}", value, back);
    }
    assert_eq!(parse_currency(""), 0.0);
    assert_eq!(parse_currency("R$ abc"), 0.0);
}

#[test]
fn csv_file_to_dashboard() {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "id;brand;model;category;purchasePrice;announcedPrice;dailyCost;adCost;saleGoalDays;entryDate;saleDate;status;salespersonId\n\
         a1;Fiat;Argo;Hatch;60.000,00;72.000,00;20,00;10,00;30;01/05/2024;;available;\n\
         a2;Fiat;Toro;Pickup;120.000,00;138.000,00;25,00;15,00;45;2024-04-01;2024-06-03;sold;sp1\n\
         a3;Fiat;Argo;Hatch;58.000,00;70.000,00;20,00;10,00;30;2024-05-10;2024-06-12;sold;sp2"
    )
    .unwrap();

    let vehicles = load_vehicles(file.path(), "c1").unwrap();
    let mut store = VehicleStore::new();
    assert_eq!(store.add_vehicles(vehicles), 3);
    assert_eq!(store.with_status("c1", VehicleStatus::Sold).len(), 2);

    let request = ReportRequest {
        company_id: "c1".into(),
        period: Period::ThisMonth,
        ..ReportRequest::default()
    };
    let report = DashboardReport::build(store.vehicles("c1"), &request, &ReportSettings::default(), now());

    assert_eq!(report.inventory.available, 1);
    assert_eq!(report.inventory.priority, 1);
    assert_eq!(report.inventory.total_loss, 45.0 * 30.0);
    assert_eq!(report.comparison.current.total_sales, 2);
    assert_eq!(report.comparison.current.total_revenue, 208000.0);
    assert_eq!(report.comparison.current.total_profit, 30000.0);
    assert_eq!(report.leaderboard.entries[0].salesperson_id, "sp1");
    assert_eq!(report.revenue_by_category[0].label, "Pickup");
    assert_eq!(report.fastest_sales[0].name, "Fiat Argo");
}

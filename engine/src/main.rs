// stock-report entry point: load a vehicle file, print the dashboard report.
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use shared::models::{Company, TeamMember};
use shared::utils::brazilian_format::{format_currency, parse_date};
use std::path::{Path, PathBuf};
use tracing::info;

use stock_engine::config::ReportSettings;
use stock_engine::inventory::{PriceRange, SalespersonSelection, StockAgeRange, StockFilter};
use stock_engine::metrics::{stock_age, Clock, FixedClock, SalesFilter, SystemClock};
use stock_engine::periods::Period;
use stock_engine::report::ReportRequest;
use stock_engine::services::StockService;
use stock_engine::EngineError;

#[derive(Debug, Parser)]
#[command(name = "stock-report", about = "Dealership stock and sales dashboard")]
struct Opts {
    /// Vehicle file, `;`-separated CSV or a JSON array
    #[arg(short, long)]
    input: PathBuf,

    /// Company to report on; also assigned to records without one
    #[arg(short, long, default_value = "default")]
    company: String,

    /// this-month, last-30-days, last-month or last-90-days
    #[arg(short, long)]
    period: Option<Period>,

    /// Report as of this date instead of now (ISO or dd/mm/yyyy)
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<DateTime<Utc>>,

    /// Only count sales made by this salesperson id
    #[arg(long)]
    salesperson: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Only count sales of this "Brand Model" (repeatable)
    #[arg(long = "model")]
    models: Vec<String>,

    /// JSON file with the company settings and its team roster
    #[arg(long)]
    team: Option<PathBuf>,

    /// JSON report settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the available vehicles matching the stock filters below
    #[arg(long)]
    stock: bool,

    /// Stock age bucket: 0-15, 16-30, 31-60 or 60+ (repeatable)
    #[arg(long = "stock-age")]
    stock_ages: Vec<StockAgeRange>,

    /// Price bucket: 0-50000, 50001-100000, 100001-150000 or 150001+ (repeatable)
    #[arg(long = "price-range")]
    price_ranges: Vec<PriceRange>,

    /// Salesperson id or "unassigned" (repeatable)
    #[arg(long = "assigned-to")]
    assigned_to: Vec<SalespersonSelection>,

    #[arg(long)]
    overdue_only: bool,

    #[arg(long)]
    priority_only: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamFile {
    company: Option<Company>,
    members: Vec<TeamMember>,
}

fn parse_as_of(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date '{}'", raw))
}

fn load_team(path: &Path) -> Result<TeamFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read team file at {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse team file at {}", path.display()))
}

fn run(opts: Opts) -> Result<()> {
    let settings = ReportSettings::load_or_default(opts.config.as_deref()).context("Failed to load settings")?;
    let clock: Box<dyn Clock> = match opts.as_of {
        Some(at) => Box::new(FixedClock(at)),
        None => Box::new(SystemClock),
    };

    let team = match &opts.team {
        Some(path) => load_team(path)?,
        None => TeamFile::default(),
    };
    if let Some(company) = &team.company {
        if company.id != opts.company {
            return Err(anyhow!(
                "Team file is for company '{}', not '{}'",
                company.id,
                opts.company
            ));
        }
    }

    let period = opts.period.unwrap_or(settings.default_period);
    let stock_filter = StockFilter {
        salespeople: opts.assigned_to.into_iter().collect(),
        stock_ages: opts.stock_ages.into_iter().collect(),
        price_ranges: opts.price_ranges.into_iter().collect(),
        overdue_only: opts.overdue_only,
        overdue_days: settings.overdue_threshold_days,
        priority_only: opts.priority_only,
        ..StockFilter::default()
    };

    let mut service = StockService::new(settings, clock);
    let summary = service.load_vehicles(&opts.input, &opts.company)?;
    info!(loaded = summary.loaded, companies = ?summary.company_ids, "Input loaded");

    let mut filter = SalesFilter {
        salesperson_id: opts.salesperson,
        category: opts.category,
        ..SalesFilter::default()
    };
    filter.models.extend(opts.models);

    let request = ReportRequest {
        company_id: opts.company.clone(),
        period,
        filter,
        company: team.company,
        roster: team.members,
    };
    let report = service.build_dashboard(&request);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }

    if opts.stock {
        let now = service.now();
        let vehicles = service.store().vehicles(&opts.company);
        let listed = stock_filter.apply(vehicles, now);
        println!();
        println!("Estoque filtrado: {} veículos", listed.len());
        for vehicle in listed {
            println!(
                "  {} {}: {} dias, {}",
                vehicle.full_name(),
                vehicle.plate,
                stock_age(vehicle, now),
                format_currency(vehicle.sale_price())
            );
            if let Some(company) = &request.company {
                for (label, value) in vehicle.visible_details(company) {
                    println!("      {}: {}", label, value);
                }
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let opts = Opts::parse();
    info!(input = %opts.input.display(), company = %opts.company, "Starting stock report");

    if let Err(err) = run(opts) {
        let code = err.downcast_ref::<EngineError>().map_or(1, EngineError::exit_code);
        eprintln!("Error: {:#}", err);
        std::process::exit(code);
    }
}

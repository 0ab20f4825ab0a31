// Dashboard report: every KPI of one company for one period, owned and
// serializable, plus a plain-text rendering for the terminal.
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Company, TeamMember, Vehicle};
use shared::utils::brazilian_format::{format_currency, format_decimal};
use std::fmt;

use crate::config::ReportSettings;
use crate::inventory::{self, AdBudget, InventorySummary};
use crate::metrics::goals::{DeadlineProgress, GaugeBand, ProgressBand, SalesGoalGauge};
use crate::metrics::leaderboard::{team_average, Leaderboard, LeaderboardEntry, TeamAverage};
use crate::metrics::loss::{ipva_status, loss_at_sale_or, IpvaStatus};
use crate::metrics::rankings::{self, ModelHighlights, SaleDuration};
use crate::metrics::sales::sold_in_window;
use crate::metrics::{PeriodComparison, SalesFilter};
use crate::periods::{Period, PeriodWindows};

/// What to report on. `vehicles` handed to [`DashboardReport::build`] are
/// expected to belong to `company_id` already.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub company_id: String,
    pub period: Period,
    pub filter: SalesFilter,
    pub company: Option<Company>,
    pub roster: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleLine {
    pub vehicle_id: String,
    pub name: String,
    pub plate: String,
    pub days_to_sell: u32,
    pub sale_price: f64,
}

impl From<&SaleDuration<'_>> for SaleLine {
    fn from(sale: &SaleDuration<'_>) -> Self {
        SaleLine {
            vehicle_id: sale.vehicle.id.clone(),
            name: sale.vehicle.full_name(),
            plate: sale.vehicle.plate.clone(),
            days_to_sell: sale.days_to_sell,
            sale_price: sale.vehicle.sale_price(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueLine {
    pub label: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpvaAlert {
    pub vehicle_id: String,
    pub name: String,
    pub plate: String,
    pub status: IpvaStatus,
}

/// Sale deadline of a vehicle still in stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineLine {
    pub vehicle_id: String,
    pub name: String,
    pub plate: String,
    pub days_left: u32,
    pub goal_days: u32,
    pub percentage: f64,
    pub band: ProgressBand,
}

impl DeadlineLine {
    fn for_vehicle(vehicle: &Vehicle, now: DateTime<Utc>) -> Self {
        let progress = DeadlineProgress::for_vehicle(vehicle, now);
        DeadlineLine {
            vehicle_id: vehicle.id.clone(),
            name: vehicle.full_name(),
            plate: vehicle.plate.clone(),
            days_left: progress.days_left,
            goal_days: progress.goal_days,
            percentage: progress.percentage(),
            band: progress.band(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedLine {
    pub salesperson_id: String,
    pub name: Option<String>,
    pub average_days_to_sell: f64,
}

impl From<&LeaderboardEntry> for SpeedLine {
    fn from(entry: &LeaderboardEntry) -> Self {
        SpeedLine {
            salesperson_id: entry.salesperson_id.clone(),
            name: entry.name.clone(),
            average_days_to_sell: entry.metrics.average_days_to_sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalLine {
    pub gauge: SalesGoalGauge,
    pub percentage: f64,
    pub band: GaugeBand,
}

impl From<SalesGoalGauge> for GoalLine {
    fn from(gauge: SalesGoalGauge) -> Self {
        GoalLine {
            gauge,
            percentage: gauge.percentage(),
            band: gauge.band(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub company_id: String,
    pub generated_at: DateTime<Utc>,
    pub period: Period,
    pub windows: PeriodWindows,
    pub inventory: InventorySummary,
    pub ad_budget: Option<AdBudget>,
    pub goal: Option<GoalLine>,
    pub comparison: PeriodComparison,
    /// Holding cost of the period's sales, accrued up to each sale date.
    pub sales_holding_loss: f64,
    pub leaderboard: Leaderboard,
    pub team_average: TeamAverage,
    /// Salespeople with sales, quickest average time to sell first.
    pub fastest_sellers: Vec<SpeedLine>,
    pub fastest_sales: Vec<SaleLine>,
    pub slowest_sales: Vec<SaleLine>,
    pub revenue_by_model: Vec<RevenueLine>,
    pub revenue_by_category: Vec<RevenueLine>,
    pub model_highlights: Option<ModelHighlights>,
    pub models_sold: Vec<String>,
    /// Vehicles in stock with a sale goal, fewest days left first.
    pub deadlines: Vec<DeadlineLine>,
    pub ipva_alerts: Vec<IpvaAlert>,
}

impl DashboardReport {
    pub fn build(
        vehicles: &[Vehicle],
        request: &ReportRequest,
        settings: &ReportSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let windows = request.period.windows(now);
        let comparison = windows.comparison(vehicles, &request.filter);
        let sales = sold_in_window(vehicles, &windows.current, &request.filter);

        // The ranking compares people, so it ignores the salesperson filter.
        let team_filter = SalesFilter {
            salesperson_id: None,
            ..request.filter.clone()
        };
        let team_sales = sold_in_window(vehicles, &windows.current, &team_filter);
        let mut leaderboard = Leaderboard::build(&team_sales);
        if !request.roster.is_empty() {
            leaderboard = leaderboard.with_roster(&request.roster);
        }
        let team_size = if request.roster.is_empty() {
            leaderboard.entries.len()
        } else {
            request.roster.iter().filter(|m| m.is_salesperson()).count()
        };
        let team_totals = crate::metrics::SalesMetrics::from_vehicles(team_sales.iter().copied());

        let inventory = InventorySummary::compute(
            vehicles,
            now,
            settings.overdue_threshold_days,
            settings.new_arrival_days,
        );

        let sales_holding_loss: f64 = sales.iter().map(|v| loss_at_sale_or(v, now)).sum();
        let fastest_sellers = leaderboard
            .fastest_average_days()
            .into_iter()
            .map(SpeedLine::from)
            .collect();

        let report = DashboardReport {
            company_id: request.company_id.clone(),
            generated_at: now,
            period: request.period,
            windows,
            inventory,
            ad_budget: request
                .company
                .as_ref()
                .map(|company| AdBudget::for_company(company, &inventory)),
            goal: Self::goal(vehicles, request, now).map(GoalLine::from),
            comparison,
            sales_holding_loss,
            team_average: team_average(&team_totals, team_size),
            fastest_sellers,
            leaderboard,
            fastest_sales: rankings::fastest_sales(&sales, settings.top_sales_limit)
                .iter()
                .map(SaleLine::from)
                .collect(),
            slowest_sales: rankings::slowest_sales(&sales, settings.top_sales_limit)
                .iter()
                .map(SaleLine::from)
                .collect(),
            revenue_by_model: revenue_lines(rankings::revenue_by_model(&sales, settings.revenue_chart_limit)),
            revenue_by_category: revenue_lines(rankings::revenue_by_category(&sales)),
            model_highlights: ModelHighlights::from_sales(&sales),
            models_sold: rankings::models_sold(&sales),
            deadlines: deadlines(vehicles, now),
            ipva_alerts: ipva_alerts(vehicles, now, settings.ipva_warning_days),
        };

        tracing::debug!(
            company_id = %report.company_id,
            period = %report.period,
            sales = report.comparison.current.total_sales,
            "Built dashboard report"
        );
        report
    }

    // A filtered salesperson on the roster gets their own gauge, otherwise the
    // company's goal applies.
    fn goal(vehicles: &[Vehicle], request: &ReportRequest, now: DateTime<Utc>) -> Option<SalesGoalGauge> {
        let member = request.filter.salesperson_id.as_deref().and_then(|id| {
            request.roster.iter().find(|m| m.id == id)
        });
        match (member, request.company.as_ref()) {
            (Some(member), _) => Some(SalesGoalGauge::for_salesperson(member, vehicles, now)),
            (None, Some(company)) => Some(SalesGoalGauge::for_company(company, vehicles, now)),
            (None, None) => None,
        }
    }

    /// Terminal view of the report, pt-BR formatted.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.comparison.current;
        let deltas = &self.comparison.deltas;

        writeln!(out, "Relatório da loja {}", self.company_id)?;
        writeln!(
            out,
            "Período: {} ({} a {})",
            self.period.label(),
            self.windows.current.start.format("%d/%m/%Y"),
            self.windows.current.end.format("%d/%m/%Y")
        )?;

        writeln!(out)?;
        writeln!(out, "Estoque")?;
        writeln!(
            out,
            "  Disponíveis: {} | Prioritários: {} | Parados: {} | Novos: {}",
            self.inventory.available, self.inventory.priority, self.inventory.overdue, self.inventory.new_arrivals
        )?;
        writeln!(out, "  Prejuízo acumulado: {}", format_currency(self.inventory.total_loss))?;
        writeln!(out, "  Valor em estoque: {}", format_currency(self.inventory.total_stock_value))?;
        writeln!(out, "  Investimento em anúncios: {}", format_currency(self.inventory.total_ad_budget))?;
        if let Some(budget) = &self.ad_budget {
            let remaining = if budget.is_over() {
                format!("{} acima", format_currency(budget.remaining.abs()))
            } else {
                format!("{} restantes", format_currency(budget.remaining))
            };
            writeln!(out, "  Verba mensal: {} ({})", format_currency(budget.monthly), remaining)?;
        }

        if let Some(goal) = &self.goal {
            writeln!(out)?;
            writeln!(
                out,
                "Meta de vendas: {}/{} ({}%)",
                goal.gauge.current,
                goal.gauge.goal,
                format_decimal(goal.percentage, 1)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Vendas (comparado ao período anterior)")?;
        writeln!(out, "  Vendas: {} ({})", current.total_sales, signed_percent(deltas.total_sales))?;
        writeln!(
            out,
            "  Receita: {} ({})",
            format_currency(current.total_revenue),
            signed_percent(deltas.total_revenue)
        )?;
        writeln!(
            out,
            "  Lucro: {} ({})",
            format_currency(current.total_profit),
            signed_percent(deltas.total_profit)
        )?;
        writeln!(
            out,
            "  Lucro médio: {} ({})",
            format_currency(current.average_profit),
            signed_percent(deltas.average_profit)
        )?;
        writeln!(
            out,
            "  Tempo médio de venda: {} dias ({})",
            format_decimal(current.average_days_to_sell, 1),
            signed_percent(deltas.average_days_to_sell)
        )?;
        writeln!(out, "  Prejuízo até a venda: {}", format_currency(self.sales_holding_loss))?;

        if !self.leaderboard.entries.is_empty() {
            writeln!(out)?;
            writeln!(out, "Ranking de vendedores")?;
            for (pos, entry) in self.leaderboard.entries.iter().enumerate() {
                writeln!(
                    out,
                    "  {}. {}: {} vendas, lucro {}",
                    pos + 1,
                    entry.name.as_deref().unwrap_or(&entry.salesperson_id),
                    entry.metrics.total_sales,
                    format_currency(entry.metrics.total_profit)
                )?;
            }
            if self.leaderboard.unassigned.total_sales > 0 {
                writeln!(out, "  Sem vendedor: {} vendas", self.leaderboard.unassigned.total_sales)?;
            }
        }

        if !self.fastest_sellers.is_empty() {
            writeln!(out)?;
            writeln!(out, "Vendedores mais ágeis")?;
            for (pos, line) in self.fastest_sellers.iter().enumerate() {
                writeln!(
                    out,
                    "  {}. {}: {} dias em média",
                    pos + 1,
                    line.name.as_deref().unwrap_or(&line.salesperson_id),
                    format_decimal(line.average_days_to_sell, 1)
                )?;
            }
        }

        write_sales(out, "Vendas mais rápidas", &self.fastest_sales)?;
        write_sales(out, "Vendas mais lentas", &self.slowest_sales)?;

        if !self.revenue_by_model.is_empty() {
            writeln!(out)?;
            writeln!(out, "Receita por modelo")?;
            for line in &self.revenue_by_model {
                writeln!(out, "  {}: {}", line.label, format_currency(line.revenue))?;
            }
        }

        if let Some(highlights) = &self.model_highlights {
            writeln!(out)?;
            writeln!(
                out,
                "Mais vendido: {} ({} vendas)",
                highlights.best_seller.model, highlights.best_seller.count
            )?;
            writeln!(
                out,
                "Maior lucro: {} ({})",
                highlights.highest_profit.model,
                format_currency(highlights.highest_profit.total_profit)
            )?;
            let lowest_label = if highlights.lowest_is_loss { "Maior prejuízo" } else { "Menor lucro" };
            writeln!(
                out,
                "{}: {} ({})",
                lowest_label,
                highlights.lowest_profit.model,
                format_currency(highlights.lowest_profit.total_profit)
            )?;
        }

        if !self.models_sold.is_empty() {
            writeln!(out)?;
            writeln!(out, "Modelos vendidos: {}", self.models_sold.join(", "))?;
        }

        let critical: Vec<&DeadlineLine> =
            self.deadlines.iter().filter(|d| d.band == ProgressBand::Red).collect();
        if !critical.is_empty() {
            writeln!(out)?;
            writeln!(out, "Prazos críticos")?;
            for line in critical {
                writeln!(
                    out,
                    "  {} {}: {} de {} dias restantes",
                    line.name, line.plate, line.days_left, line.goal_days
                )?;
            }
        }

        if !self.ipva_alerts.is_empty() {
            writeln!(out)?;
            writeln!(out, "IPVA")?;
            for alert in &self.ipva_alerts {
                let status = match alert.status {
                    IpvaStatus::Overdue => "vencido".to_string(),
                    IpvaStatus::DueSoon { days } => format!("vence em {} dias", days),
                    IpvaStatus::UpToDate => "em dia".to_string(),
                };
                writeln!(out, "  {} {}: {}", alert.name, alert.plate, status)?;
            }
        }
        Ok(())
    }
}

fn write_sales(out: &mut fmt::Formatter<'_>, title: &str, lines: &[SaleLine]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{}", title)?;
    for line in lines {
        writeln!(
            out,
            "  {} {}: {} dias, {}",
            line.name,
            line.plate,
            line.days_to_sell,
            format_currency(line.sale_price)
        )?;
    }
    Ok(())
}

fn signed_percent(value: f64) -> String {
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{}{}%", sign, format_decimal(value, 1))
}

fn revenue_lines(totals: Vec<(String, f64)>) -> Vec<RevenueLine> {
    totals
        .into_iter()
        .map(|(label, revenue)| RevenueLine { label, revenue })
        .collect()
}

fn deadlines(vehicles: &[Vehicle], now: DateTime<Utc>) -> Vec<DeadlineLine> {
    let mut lines: Vec<DeadlineLine> = inventory::available(vehicles)
        .filter(|v| v.sale_goal_days > 0)
        .map(|v| DeadlineLine::for_vehicle(v, now))
        .collect();
    lines.sort_by_key(|line| line.days_left);
    lines
}

// Overdue or soon-due IPVA of the vehicles still in stock.
fn ipva_alerts(vehicles: &[Vehicle], now: DateTime<Utc>, warning_days: u32) -> Vec<IpvaAlert> {
    inventory::available(vehicles)
        .filter_map(|v| {
            let status = ipva_status(v, now, warning_days)?;
            (status != IpvaStatus::UpToDate).then(|| IpvaAlert {
                vehicle_id: v.id.clone(),
                name: v.full_name(),
                plate: v.plate.clone(),
                status,
            })
        })
        .collect()
}

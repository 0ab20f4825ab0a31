// Salesperson ranking over a set of sales.
use serde::Serialize;
use shared::models::{TeamMember, Vehicle};

use super::group_in_order;
use super::sales::SalesMetrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub salesperson_id: String,
    pub name: Option<String>,
    pub metrics: SalesMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Sales with nobody assigned. Reported, never ranked.
    pub unassigned: SalesMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamAverage {
    pub total_sales: f64,
    pub total_profit: f64,
}

const UNASSIGNED: &str = "";

impl Leaderboard {
    /// Ranks salespeople by number of sales, then by profit. Groups that tie on
    /// both keep the order in which they first appear in `sales`.
    pub fn build(sales: &[&Vehicle]) -> Self {
        let groups = group_in_order(sales, |v| {
            v.salesperson_id.clone().unwrap_or_else(|| UNASSIGNED.to_string())
        });

        let mut unassigned = SalesMetrics::default();
        let mut entries = Vec::with_capacity(groups.len());
        for (salesperson_id, vehicles) in groups {
            let metrics = SalesMetrics::from_vehicles(vehicles);
            if salesperson_id == UNASSIGNED {
                unassigned = metrics;
            } else {
                entries.push(LeaderboardEntry {
                    salesperson_id,
                    name: None,
                    metrics,
                });
            }
        }

        sort_entries(&mut entries);
        Leaderboard { entries, unassigned }
    }

    /// Restricts the ranking to the salespeople on `roster`, giving members
    /// without sales a zeroed row, and fills in their names.
    pub fn with_roster(self, roster: &[TeamMember]) -> Self {
        let mut entries: Vec<LeaderboardEntry> = roster
            .iter()
            .filter(|member| member.is_salesperson())
            .map(|member| {
                let metrics = self
                    .entries
                    .iter()
                    .find(|e| e.salesperson_id == member.id)
                    .map(|e| e.metrics)
                    .unwrap_or_default();
                LeaderboardEntry {
                    salesperson_id: member.id.clone(),
                    name: Some(member.name.clone()),
                    metrics,
                }
            })
            .collect();

        sort_entries(&mut entries);
        Leaderboard {
            entries,
            unassigned: self.unassigned,
        }
    }

    /// Zero-based position of `salesperson_id`, if ranked.
    pub fn rank_of(&self, salesperson_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.salesperson_id == salesperson_id)
    }

    /// Salespeople with at least one sale, quickest average sale first.
    pub fn fastest_average_days(&self) -> Vec<&LeaderboardEntry> {
        let mut with_sales: Vec<&LeaderboardEntry> = self
            .entries
            .iter()
            .filter(|e| e.metrics.total_sales > 0)
            .collect();
        with_sales.sort_by(|a, b| {
            a.metrics
                .average_days_to_sell
                .total_cmp(&b.metrics.average_days_to_sell)
        });
        with_sales
    }
}

/// Per-member share of the team's totals; zero for an empty team.
pub fn team_average(totals: &SalesMetrics, team_size: usize) -> TeamAverage {
    if team_size == 0 {
        return TeamAverage::default();
    }
    let size = team_size as f64;
    TeamAverage {
        total_sales: totals.total_sales as f64 / size,
        total_profit: totals.total_profit / size,
    }
}

fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.metrics
            .total_sales
            .cmp(&a.metrics.total_sales)
            .then_with(|| b.metrics.total_profit.total_cmp(&a.metrics.total_profit))
    });
}

// Weekly team projections with volume-weighted shooting percentages.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::category::{round_to, Category, CategoryMap};
use crate::identity::{resolve_roster, Resolver};
use crate::line::CategoryLine;
use crate::schedule::{games_in_period, PeriodId, PeriodSchedule};
use crate::stats::RosterEntry;

/// Projected category totals for one team over one period.
#[derive(Debug, Clone, Serialize)]
pub struct TeamProjection {
    pub team_name: String,
    pub period: PeriodId,
    pub totals: CategoryMap<f64>,
    pub lines: Vec<CategoryLine>,
    pub games_per_player: HashMap<String, u32>,
}

impl TeamProjection {
    pub fn total(&self, cat: Category) -> f64 {
        self.totals[cat]
    }

    /// Sum of the assumed game counts for players in `lines`.
    pub fn games_used(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| self.games_per_player.get(&l.name).copied().unwrap_or(0))
            .sum()
    }
}

/// Running sums for one projection.
#[derive(Debug, Default)]
struct Accumulator {
    counting: CategoryMap<f64>,
    fgm_adj: f64,
    fga: f64,
    ftm: f64,
    fta: f64,
}

impl Accumulator {
    fn add(&mut self, line: &CategoryLine, games: f64) {
        for cat in Category::ALL {
            if cat.is_percentage() {
                continue;
            }
            if let Some(rate) = line.value(cat) {
                self.counting[cat] += rate * games;
            }
        }
        self.fgm_adj += (line.fgm_pg + 0.5 * line.tpm_raw_pg) * games;
        self.fga += line.fga_pg * games;
        self.ftm += line.ftm_pg * games;
        self.fta += line.fta_pg * games;
    }

    fn finish(&self) -> CategoryMap<f64> {
        let pct = |made: f64, attempted: f64| {
            if attempted > 0.0 {
                round_to(made / attempted, 4)
            } else {
                0.0
            }
        };
        CategoryMap::from_fn(|cat| match cat {
            Category::AdjFgPct => pct(self.fgm_adj, self.fga),
            Category::FtPct => pct(self.ftm, self.fta),
            _ => round_to(self.counting[cat], 1),
        })
    }
}

/// Project a roster's category totals for a period.
///
/// Counting categories and turnovers sum `rate * games`. Percentages sum
/// makes and attempts across the roster before dividing, and are 0.0 with
/// no attempts. Players absent from `games_per_player` or assigned zero
/// games contribute nothing. Counting totals round to 1 decimal,
/// percentages to 4.
pub fn project_team_week(
    lines: &[CategoryLine],
    games_per_player: &HashMap<String, u32>,
    period: PeriodId,
    team_name: &str,
) -> TeamProjection {
    let mut acc = Accumulator::default();
    let mut contributors = 0usize;
    for line in lines {
        let games = games_per_player.get(&line.name).copied().unwrap_or(0);
        if games == 0 {
            continue;
        }
        acc.add(line, games as f64);
        contributors += 1;
    }
    debug!(
        "projected {} for period {}: {} of {} players contribute",
        team_name,
        period,
        contributors,
        lines.len()
    );

    TeamProjection {
        team_name: team_name.to_string(),
        period,
        totals: acc.finish(),
        lines: lines.to_vec(),
        games_per_player: games_per_player.clone(),
    }
}

/// Project every fantasy team using its resolved roster and the period's
/// per-team game counts. Unmatched roster entries are left out.
pub fn project_all_teams(
    resolver: &Resolver<'_>,
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
    schedule: &PeriodSchedule,
    period: PeriodId,
) -> BTreeMap<String, TeamProjection> {
    rosters
        .iter()
        .map(|(team, entries)| {
            let lines = resolve_roster(resolver, entries).lines();
            let games = games_in_period(&lines, schedule);
            (team.clone(), project_team_week(&lines, &games, period, team))
        })
        .collect()
}

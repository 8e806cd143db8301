// Games-played-capped daily lineup planning.
//
// Each scoring period caps the total number of player-games a fantasy team
// may start. The optimizer walks the period day by day and starts the most
// valuable eligible players until either the active slots or the remaining
// budget run out.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::line::CategoryLine;
use crate::projection::{project_team_week, TeamProjection};
use crate::schedule::{PeriodId, PeriodSchedule};

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// A player left on the bench for a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchedPlayer {
    pub name: String,
    pub team: String,
    pub value: f64,
}

/// One day of a lineup plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    /// Rostered players whose team plays today.
    pub playing: usize,
    pub starters: Vec<String>,
    pub benched: Vec<BenchedPlayer>,
    /// Games started through the end of this day.
    pub cumulative_games: u32,
}

impl DayPlan {
    pub fn started(&self) -> usize {
        self.starters.len()
    }
}

/// Day-by-day start/sit plan for one roster over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupPlan {
    pub days: Vec<DayPlan>,
    pub total_games: u32,
    /// Starts per player. Every rostered player appears, possibly with 0.
    pub effective_games: BTreeMap<String, u32>,
    pub gp_max: u32,
    pub active_slots: usize,
}

impl LineupPlan {
    /// Effective games as the map shape the projector consumes.
    pub fn games_map(&self) -> HashMap<String, u32> {
        self.effective_games
            .iter()
            .map(|(name, games)| (name.clone(), *games))
            .collect()
    }
}

/// Lineup constraints for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineupLimits {
    /// Players that can start on the same day.
    pub active_slots: usize,
    /// Total starts allowed across the period.
    pub gp_max: u32,
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Players whose team plays on `date`, most valuable first. Equal values
/// keep roster order.
fn eligible_on<'a>(
    lines: &'a [CategoryLine],
    schedule: &PeriodSchedule,
    values: &HashMap<String, f64>,
    date: NaiveDate,
) -> Vec<(&'a CategoryLine, f64)> {
    let mut eligible: Vec<(&CategoryLine, f64)> = lines
        .iter()
        .filter(|line| schedule.plays_on(&line.team, date))
        .map(|line| (line, values.get(&line.name).copied().unwrap_or(0.0)))
        .collect();
    eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    eligible
}

/// Dates on which at least one rostered player's team plays, ascending.
pub fn roster_game_dates(lines: &[CategoryLine], schedule: &PeriodSchedule) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = lines
        .iter()
        .flat_map(|line| schedule.dates_for(&line.team).iter().copied())
        .collect();
    dates.into_iter().collect()
}

/// Greedy day-by-day lineup under a games-played cap.
///
/// On each date the eligible players are ranked by `values` (missing
/// values count as 0.0) and the top `min(eligible, slots, remaining budget)`
/// start. The cumulative total never decreases and never exceeds
/// `limits.gp_max`.
pub fn optimize_lineup(
    lines: &[CategoryLine],
    schedule: &PeriodSchedule,
    values: &HashMap<String, f64>,
    limits: LineupLimits,
) -> LineupPlan {
    let mut effective_games: BTreeMap<String, u32> =
        lines.iter().map(|l| (l.name.clone(), 0)).collect();
    let mut cumulative: u32 = 0;
    let mut days = Vec::new();

    for date in roster_game_dates(lines, schedule) {
        let eligible = eligible_on(lines, schedule, values, date);
        let remaining = limits.gp_max.saturating_sub(cumulative) as usize;
        let can_start = eligible.len().min(limits.active_slots).min(remaining);

        let (start, bench) = eligible.split_at(can_start);
        for (line, _) in start {
            *effective_games.entry(line.name.clone()).or_insert(0) += 1;
        }
        cumulative += can_start as u32;

        if remaining < eligible.len().min(limits.active_slots) {
            debug!(
                "{}: budget allows {} of {} eligible starts",
                date,
                remaining,
                eligible.len()
            );
        }

        days.push(DayPlan {
            date,
            playing: eligible.len(),
            starters: start.iter().map(|(line, _)| line.name.clone()).collect(),
            benched: bench
                .iter()
                .map(|(line, value)| BenchedPlayer {
                    name: line.name.clone(),
                    team: line.team.clone(),
                    value: *value,
                })
                .collect(),
            cumulative_games: cumulative,
        });
    }

    LineupPlan {
        days,
        total_games: cumulative,
        effective_games,
        gp_max: limits.gp_max,
        active_slots: limits.active_slots,
    }
}

/// Project the roster using the plan's effective game counts.
pub fn project_with_lineup(
    plan: &LineupPlan,
    lines: &[CategoryLine],
    period: PeriodId,
    team_name: &str,
) -> TeamProjection {
    project_team_week(lines, &plan.games_map(), period, team_name)
}

// ---------------------------------------------------------------------------
// Budget helpers
// ---------------------------------------------------------------------------

/// Available starts for a roster against the period cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GpBudget {
    /// Sum over rostered players of their team's games in the period.
    pub available_starts: u32,
    pub gp_max: u32,
}

impl GpBudget {
    /// Starts that must be benched to stay under the cap.
    pub fn excess(&self) -> u32 {
        self.available_starts.saturating_sub(self.gp_max)
    }

    pub fn fits(&self) -> bool {
        self.available_starts <= self.gp_max
    }
}

pub fn gp_budget(lines: &[CategoryLine], schedule: &PeriodSchedule, gp_max: u32) -> GpBudget {
    let available_starts = lines
        .iter()
        .map(|line| schedule.dates_for(&line.team).len() as u32)
        .sum();
    GpBudget {
        available_starts,
        gp_max,
    }
}

/// Reduce `games` until its total fits under `cap`, benching the lowest
/// points-per-game players first. Returns the input unchanged when it
/// already fits.
pub fn trim_games_to_cap(
    lines: &[CategoryLine],
    games: &HashMap<String, u32>,
    cap: u32,
) -> HashMap<String, u32> {
    let mut total: u32 = games.values().sum();
    if total <= cap {
        return games.clone();
    }
    let mut managed = games.clone();
    let mut by_points: Vec<&CategoryLine> = lines.iter().collect();
    by_points.sort_by(|a, b| a.pts_pg.partial_cmp(&b.pts_pg).unwrap_or(Ordering::Equal));

    for line in by_points {
        if total <= cap {
            break;
        }
        let Some(g) = managed.get_mut(&line.name) else {
            continue;
        };
        let reduce = (*g).min(total - cap);
        *g -= reduce;
        total -= reduce;
    }
    managed
}

/// A date with fewer rostered players than active slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenDay {
    pub date: NaiveDate,
    pub open_slots: usize,
}

/// League game dates on which the roster leaves slots empty.
pub fn open_streaming_days(
    lines: &[CategoryLine],
    schedule: &PeriodSchedule,
    active_slots: usize,
) -> Vec<OpenDay> {
    schedule
        .all_dates()
        .into_iter()
        .filter_map(|date| {
            let playing = lines
                .iter()
                .filter(|line| schedule.plays_on(&line.team, date))
                .count();
            (playing < active_slots).then(|| OpenDay {
                date,
                open_slots: active_slots - playing,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

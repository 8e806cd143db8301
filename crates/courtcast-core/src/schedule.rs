// Scoring-period schedules: game counts and game dates per team.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::line::CategoryLine;

/// Scoring period number, e.g. 14 for the fourteenth week of the season.
pub type PeriodId = u32;

/// One game between two conference teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub date: NaiveDate,
    pub away: String,
    pub home: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

/// Games for one scoring period.
///
/// `games_per_team` feeds the weekly projector; `game_dates_per_team`
/// feeds the lineup optimizer. A team absent from both plays zero games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSchedule {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub games_per_team: BTreeMap<String, u32>,
    #[serde(default)]
    pub game_dates_per_team: BTreeMap<String, Vec<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub games: Vec<ScheduledGame>,
}

impl PeriodSchedule {
    /// Build a period from a list of games, keeping only those dated within
    /// `start..=end`. Per-team dates come out sorted.
    pub fn from_games(start: NaiveDate, end: NaiveDate, games: &[ScheduledGame]) -> Self {
        let in_window: Vec<ScheduledGame> = games
            .iter()
            .filter(|g| g.date >= start && g.date <= end)
            .cloned()
            .collect();

        let mut dates: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        for game in &in_window {
            for team in [&game.away, &game.home] {
                dates.entry(team.clone()).or_default().push(game.date);
            }
        }
        for list in dates.values_mut() {
            list.sort_unstable();
        }
        let games_per_team = dates
            .iter()
            .map(|(team, list)| (team.clone(), list.len() as u32))
            .collect();

        PeriodSchedule {
            start: Some(start),
            end: Some(end),
            games_per_team,
            game_dates_per_team: dates,
            games: in_window,
        }
    }

    /// Games `team` plays in the period. Falls back to the length of its
    /// date list when the count table has no entry.
    pub fn games_for(&self, team: &str) -> u32 {
        self.games_per_team
            .get(team)
            .copied()
            .unwrap_or_else(|| self.dates_for(team).len() as u32)
    }

    pub fn dates_for(&self, team: &str) -> &[NaiveDate] {
        self.game_dates_per_team
            .get(team)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn plays_on(&self, team: &str, date: NaiveDate) -> bool {
        self.dates_for(team).contains(&date)
    }

    /// Every date on which any team plays, ascending.
    pub fn all_dates(&self) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self
            .game_dates_per_team
            .values()
            .flatten()
            .copied()
            .collect();
        set.into_iter().collect()
    }

    /// Teams with a game on `date`, in name order.
    pub fn teams_playing_on(&self, date: NaiveDate) -> Vec<&str> {
        self.game_dates_per_team
            .iter()
            .filter(|(_, dates)| dates.contains(&date))
            .map(|(team, _)| team.as_str())
            .collect()
    }

    /// Teams with at least one game.
    pub fn scheduled_teams(&self) -> BTreeSet<&str> {
        self.games_per_team
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(team, _)| team.as_str())
            .chain(
                self.game_dates_per_team
                    .iter()
                    .filter(|(_, d)| !d.is_empty())
                    .map(|(team, _)| team.as_str()),
            )
            .collect()
    }
}

/// All known scoring periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueSchedule {
    periods: BTreeMap<PeriodId, PeriodSchedule>,
}

impl LeagueSchedule {
    pub fn new() -> Self {
        LeagueSchedule::default()
    }

    pub fn insert(&mut self, period: PeriodId, schedule: PeriodSchedule) {
        self.periods.insert(period, schedule);
    }

    pub fn period(&self, period: PeriodId) -> Option<&PeriodSchedule> {
        self.periods.get(&period)
    }

    /// Period ids in ascending order.
    pub fn period_ids(&self) -> Vec<PeriodId> {
        self.periods.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Games each line's team plays in `schedule`, keyed by player name.
pub fn games_in_period(lines: &[CategoryLine], schedule: &PeriodSchedule) -> HashMap<String, u32> {
    lines
        .iter()
        .map(|line| (line.name.clone(), schedule.games_for(&line.team)))
        .collect()
}

// Past matchup standings: a team's category values over time and
// per-period category ranks across the league.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryMap};
use crate::schedule::PeriodId;

/// A standings cell. The roster platform reports most numbers as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StandingsCell {
    Number(f64),
    Text(String),
}

impl StandingsCell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StandingsCell::Number(n) => Some(*n),
            StandingsCell::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One team's row in one period's standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    #[serde(default)]
    pub team_name: String,
    /// Category values and W/L/T keyed by their column label.
    #[serde(flatten)]
    pub cells: BTreeMap<String, Option<StandingsCell>>,
}

impl StandingsRow {
    /// The category value, or `None` when absent or unparsable.
    pub fn value(&self, cat: Category) -> Option<f64> {
        self.cell(cat.label())
    }

    fn cell(&self, key: &str) -> Option<f64> {
        self.cells.get(key)?.as_ref()?.as_f64()
    }

    fn count(&self, key: &str) -> u32 {
        self.cell(key).map(|v| v.max(0.0) as u32).unwrap_or(0)
    }

    pub fn wins(&self) -> u32 {
        self.count("W")
    }

    pub fn losses(&self) -> u32 {
        self.count("L")
    }

    pub fn ties(&self) -> u32 {
        self.count("T")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStandings {
    #[serde(default)]
    pub rows: Vec<StandingsRow>,
}

/// Standings for every completed period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchupHistory {
    periods: BTreeMap<PeriodId, PeriodStandings>,
}

impl MatchupHistory {
    pub fn insert(&mut self, period: PeriodId, standings: PeriodStandings) {
        self.periods.insert(period, standings);
    }

    pub fn period(&self, period: PeriodId) -> Option<&PeriodStandings> {
        self.periods.get(&period)
    }

    pub fn latest_period(&self) -> Option<PeriodId> {
        self.periods.keys().next_back().copied()
    }

    /// Periods in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (PeriodId, &PeriodStandings)> {
        self.periods.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// One team's results for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPeriodLine {
    pub period: PeriodId,
    pub values: CategoryMap<Option<f64>>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// A team's category values and record in every period it appears in,
/// ascending by period.
pub fn team_historical_cats(history: &MatchupHistory, team_name: &str) -> Vec<TeamPeriodLine> {
    history
        .iter()
        .filter_map(|(period, standings)| {
            let row = standings.rows.iter().find(|r| r.team_name == team_name)?;
            Some(TeamPeriodLine {
                period,
                values: CategoryMap::from_fn(|cat| row.value(cat)),
                wins: row.wins(),
                losses: row.losses(),
                ties: row.ties(),
            })
        })
        .collect()
}

/// Category ranks for every team in one period (the latest when `period`
/// is `None`). Rank 1 is best; for turnovers the lowest value ranks first.
/// Unparsable values count as 0.0. An unknown period yields an empty map.
pub fn team_category_ranks(
    history: &MatchupHistory,
    period: Option<PeriodId>,
) -> BTreeMap<String, CategoryMap<u32>> {
    let Some(period) = period.or_else(|| history.latest_period()) else {
        return BTreeMap::new();
    };
    let Some(standings) = history.period(period) else {
        return BTreeMap::new();
    };

    let teams: Vec<(&str, CategoryMap<f64>)> = standings
        .rows
        .iter()
        .filter(|r| !r.team_name.is_empty())
        .map(|r| {
            (
                r.team_name.as_str(),
                CategoryMap::from_fn(|cat| r.value(cat).unwrap_or(0.0)),
            )
        })
        .collect();

    let mut ranks: BTreeMap<String, CategoryMap<u32>> = teams
        .iter()
        .map(|(name, _)| (name.to_string(), CategoryMap::default()))
        .collect();

    for cat in Category::ALL {
        let mut order: Vec<&(&str, CategoryMap<f64>)> = teams.iter().collect();
        order.sort_by(|a, b| {
            let (x, y) = (a.1[cat], b.1[cat]);
            let cmp = if cat.is_inverse() {
                x.partial_cmp(&y)
            } else {
                y.partial_cmp(&x)
            };
            cmp.unwrap_or(Ordering::Equal)
        });
        for (i, (name, _)) in order.into_iter().enumerate() {
            if let Some(team_ranks) = ranks.get_mut(*name) {
                team_ranks[cat] = i as u32 + 1;
            }
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"{
        "2": {"rows": [
            {"team_name": "Alpha", "AdjFG%": "0.540", "3PTM": "40", "FT%": "0.700", "PTS": "500", "REB": "200", "AST": "100", "ST": "30", "BLK": "20", "TO": "60", "W": "5", "L": "3", "T": "1"},
            {"team_name": "Beta", "AdjFG%": "0.500", "3PTM": "45", "FT%": "--", "PTS": "520", "REB": "190", "AST": "110", "ST": "35", "BLK": "25", "TO": "50", "W": 3, "L": 5, "T": 1}
        ]},
        "1": {"rows": [
            {"team_name": "Alpha", "AdjFG%": "0.520", "PTS": "480", "TO": "70", "W": "4", "L": "5", "T": "0"},
            {"team_name": "", "PTS": "1"}
        ]}
    }"#;

    fn history() -> MatchupHistory {
        serde_json::from_str(HISTORY).unwrap()
    }

    #[test]
    fn historical_cats_sorted_by_period() {
        let lines = team_historical_cats(&history(), "Alpha");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].period, 1);
        assert_eq!(lines[0].values[Category::Points], Some(480.0));
        assert_eq!(lines[0].values[Category::Rebounds], None);
        assert_eq!(lines[1].period, 2);
        assert_eq!((lines[1].wins, lines[1].losses, lines[1].ties), (5, 3, 1));
    }

    #[test]
    fn unparsable_values_are_none() {
        let lines = team_historical_cats(&history(), "Beta");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].values[Category::FtPct], None);
        assert_eq!(lines[0].wins, 3);
    }

    #[test]
    fn ranks_use_latest_period_and_invert_turnovers() {
        let ranks = team_category_ranks(&history(), None);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks["Beta"][Category::Points], 1);
        assert_eq!(ranks["Alpha"][Category::Rebounds], 1);
        // Beta has fewer turnovers.
        assert_eq!(ranks["Beta"][Category::Turnovers], 1);
        assert_eq!(ranks["Alpha"][Category::Turnovers], 2);
        // Unparsable FT% counts as 0.
        assert_eq!(ranks["Alpha"][Category::FtPct], 1);
    }

    #[test]
    fn explicit_period_skips_blank_names() {
        let ranks = team_category_ranks(&history(), Some(1));
        assert_eq!(ranks.len(), 1);
        assert!(team_category_ranks(&history(), Some(9)).is_empty());
        assert!(team_category_ranks(&MatchupHistory::default(), None).is_empty());
    }
}

// Data-quality checks over raw snapshots.
//
// These never alter inputs. Each check records a name, a pass flag and a
// human-readable detail so a person can decide whether to trust a refresh.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::history::MatchupHistory;
use crate::identity::{normalize_name, Resolver, TeamNameMap};
use crate::schedule::{LeagueSchedule, PeriodId};
use crate::stats::{PlayerSeasonStat, RosterEntry};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub checks: Vec<QualityCheck>,
}

impl DataQualityReport {
    pub fn add(&mut self, name: impl Into<String>, passed: bool, detail: impl Into<String>) {
        self.checks.push(QualityCheck {
            name: name.into(),
            passed,
            detail: detail.into(),
        });
    }

    pub fn extend(&mut self, other: DataQualityReport) {
        self.checks.extend(other.checks);
    }

    /// True when every check passed. An empty report passes.
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &QualityCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// `"<passed>/<total> checks passed"`.
    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!("{}/{} checks passed", passed, self.checks.len())
    }
}

/// Thresholds and expected shapes the checks compare against.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityExpectations {
    pub min_players: usize,
    /// Canonical labels of every conference team.
    pub expected_teams: BTreeSet<String>,
    pub min_qualified_per_team: usize,
    /// Games a player needs to count toward `min_qualified_per_team`.
    pub qualified_games: u32,
    pub max_mpg: f64,
    pub min_match_rate: f64,
    /// Periods the schedule snapshot must contain.
    pub required_periods: Vec<PeriodId>,
    pub min_scheduled_teams: usize,
    pub min_history_periods: usize,
    /// Fantasy teams in the league, expected in every standings period.
    pub league_teams: usize,
}

impl Default for QualityExpectations {
    fn default() -> Self {
        QualityExpectations {
            min_players: 200,
            expected_teams: TeamNameMap::default()
                .canonical_teams()
                .into_iter()
                .map(String::from)
                .collect(),
            min_qualified_per_team: 5,
            qualified_games: 5,
            max_mpg: 45.0,
            min_match_rate: 0.9,
            required_periods: vec![14, 15, 16, 17],
            min_scheduled_teams: 12,
            min_history_periods: 10,
            league_teams: 8,
        }
    }
}

fn list_or_clean(names: &[String]) -> String {
    if names.is_empty() {
        "Clean".to_string()
    } else {
        format!("Violations: {}", names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Snapshot checks
// ---------------------------------------------------------------------------

/// Structural checks on the statistics population.
pub fn run_player_quality(players: &[PlayerSeasonStat], exp: &QualityExpectations) -> DataQualityReport {
    let mut report = DataQualityReport::default();

    report.add(
        format!("Player count >= {}", exp.min_players),
        players.len() >= exp.min_players,
        format!("{} players loaded", players.len()),
    );

    let present: BTreeSet<&str> = players.iter().map(|p| p.team.as_str()).collect();
    let missing: Vec<String> = exp
        .expected_teams
        .iter()
        .filter(|t| !present.contains(t.as_str()))
        .cloned()
        .collect();
    report.add(
        format!("All {} teams present", exp.expected_teams.len()),
        missing.is_empty(),
        if missing.is_empty() {
            "All teams present".to_string()
        } else {
            format!("Missing: {}", missing.join(", "))
        },
    );

    let negatives: usize = players
        .iter()
        .map(|p| {
            [p.fgm, p.fga, p.ftm, p.fta, p.tpm, p.reb, p.ast, p.stl, p.blk, p.to, p.pts]
                .iter()
                .filter(|v| **v < 0)
                .count()
        })
        .sum();
    report.add(
        "No negative stat values",
        negatives == 0,
        if negatives == 0 {
            "Clean".to_string()
        } else {
            format!("{negatives} negative values found")
        },
    );

    let violators = |bad: fn(&PlayerSeasonStat) -> bool| -> Vec<String> {
        players.iter().filter(|p| bad(p)).map(|p| p.name.clone()).collect()
    };

    let fg = violators(|p| p.fgm > p.fga);
    report.add("FGM <= FGA for all players", fg.is_empty(), list_or_clean(&fg));
    let ft = violators(|p| p.ftm > p.fta);
    report.add("FTM <= FTA for all players", ft.is_empty(), list_or_clean(&ft));
    let threes = violators(|p| p.tpm > p.fgm);
    report.add("3PM <= FGM for all players", threes.is_empty(), list_or_clean(&threes));

    let pts = violators(|p| {
        let (fgm, tpm, ftm) = (i64::from(p.fgm), i64::from(p.tpm), i64::from(p.ftm));
        i64::from(p.pts) != 2 * (fgm - tpm) + 3 * tpm + ftm
    });
    report.add(
        "PTS = 2*(FGM-3PM) + 3*3PM + FTM",
        pts.is_empty(),
        if pts.is_empty() {
            "Clean".to_string()
        } else {
            format!("{} mismatches", pts.len())
        },
    );

    let high_mpg: Vec<String> = players
        .iter()
        .filter(|p| p.minutes_per_game() > exp.max_mpg)
        .map(|p| p.name.clone())
        .collect();
    report.add(
        format!("MPG <= {} for all players", exp.max_mpg),
        high_mpg.is_empty(),
        list_or_clean(&high_mpg),
    );

    for team in &exp.expected_teams {
        let qualified = players
            .iter()
            .filter(|p| &p.team == team && p.games >= exp.qualified_games)
            .count();
        report.add(
            format!("{team}: {}+ qualified players", exp.min_qualified_per_team),
            qualified >= exp.min_qualified_per_team,
            format!("{qualified} players with {}+ games", exp.qualified_games),
        );
    }

    report
}

/// How completely each fantasy roster resolves to statistics records.
pub fn run_roster_match_quality(
    resolver: &Resolver<'_>,
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
    exp: &QualityExpectations,
) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    let mut total = 0usize;
    let mut total_matched = 0usize;

    for (team_name, entries) in rosters {
        let unmatched: Vec<String> = entries
            .iter()
            .filter(|e| !resolver.resolve_entry(e).is_matched())
            .map(|e| format!("{} ({})", e.name, e.team))
            .collect();
        let matched = entries.len() - unmatched.len();
        total += entries.len();
        total_matched += matched;

        let mut detail = format!("{}/{} matched", matched, entries.len());
        if !unmatched.is_empty() {
            detail.push_str(&format!(" | Unmatched: {}", unmatched.join(", ")));
        }
        report.add(format!("{team_name}: roster match"), unmatched.is_empty(), detail);
    }

    let rate = if total > 0 {
        total_matched as f64 / total as f64
    } else {
        0.0
    };
    report.add(
        format!("Overall match rate >= {:.0}%", exp.min_match_rate * 100.0),
        rate >= exp.min_match_rate,
        format!("{}/{} ({:.1}%)", total_matched, total, rate * 100.0),
    );
    report
}

/// Required periods present and enough conference teams scheduled.
pub fn run_schedule_quality(schedule: &LeagueSchedule, exp: &QualityExpectations) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    for &period in &exp.required_periods {
        let found = schedule.period(period);
        report.add(
            format!("Period {period} present"),
            found.is_some(),
            if found.is_some() { "Found" } else { "Missing" },
        );
        if let Some(p) = found {
            let scheduled = p
                .scheduled_teams()
                .into_iter()
                .filter(|t| exp.expected_teams.contains(*t))
                .count();
            report.add(
                format!("Period {period}: conference teams scheduled"),
                scheduled >= exp.min_scheduled_teams,
                format!("{scheduled} conference teams have games"),
            );
        }
    }
    report
}

/// Standings history depth, league size per period, and complete records.
pub fn run_matchup_quality(history: &MatchupHistory, exp: &QualityExpectations) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    report.add(
        format!("At least {} periods of history", exp.min_history_periods),
        history.len() >= exp.min_history_periods,
        format!("{} periods found", history.len()),
    );

    let mut bad_records = Vec::new();
    for (period, standings) in history.iter() {
        report.add(
            format!("Period {period}: {} teams", exp.league_teams),
            standings.rows.len() == exp.league_teams,
            format!("{} teams", standings.rows.len()),
        );
        for row in &standings.rows {
            let (w, l, t) = (row.wins(), row.losses(), row.ties());
            if u64::from(w) + u64::from(l) + u64::from(t) != 9 {
                bad_records.push(format!("P{period} {}: {w}W-{l}L-{t}T", row.team_name));
            }
        }
    }
    report.add(
        "W+L+T = 9 for all teams/periods",
        bad_records.is_empty(),
        if bad_records.is_empty() {
            "Clean".to_string()
        } else {
            let shown: Vec<String> = bad_records.iter().take(5).cloned().collect();
            format!("Violations: {}", shown.join(", "))
        },
    );
    report
}

// ---------------------------------------------------------------------------
// Cross-reference against the roster platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ValidationStatus {
    /// Found on the roster platform under the same team.
    Clean,
    /// Same name under a different team, or a team outside the conference.
    MismatchConfirmed,
    /// Only the last name matched, on the same team.
    NameMismatch,
    NotInLeague,
}

/// A roster-platform player, rostered or free.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueEntry {
    pub name: String,
    pub canonical_team: String,
    pub raw_team: String,
    /// Owning fantasy team; `None` for free agents.
    pub fantasy_team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerValidation {
    pub name: String,
    pub team: String,
    pub games: u32,
    pub status: ValidationStatus,
    pub detail: String,
    pub league_match: Option<LeagueEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub results: Vec<PlayerValidation>,
    pub counts: BTreeMap<ValidationStatus, usize>,
    /// Teams in the statistics population outside the expected set.
    pub foreign_teams: BTreeSet<String>,
    pub clean_pct: f64,
}

impl ValidationReport {
    pub fn issues(&self) -> impl Iterator<Item = &PlayerValidation> {
        self.results
            .iter()
            .filter(|r| r.status != ValidationStatus::Clean)
    }

    pub fn count(&self, status: ValidationStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Normalized name -> roster-platform entries.
fn league_index(
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
    free_agents: &[RosterEntry],
    teams: &TeamNameMap,
) -> HashMap<String, Vec<LeagueEntry>> {
    let mut index: HashMap<String, Vec<LeagueEntry>> = HashMap::new();
    let rostered = rosters
        .iter()
        .flat_map(|(owner, entries)| entries.iter().map(move |e| (e, Some(owner.clone()))));
    let free = free_agents.iter().map(|e| (e, None));
    for (entry, fantasy_team) in rostered.chain(free) {
        index
            .entry(normalize_name(&entry.name))
            .or_default()
            .push(LeagueEntry {
                name: entry.name.clone(),
                canonical_team: teams.canonical(&entry.team).to_string(),
                raw_team: entry.team.clone(),
                fantasy_team,
            });
    }
    index
}

fn find_in_league(
    player: &PlayerSeasonStat,
    index: &HashMap<String, Vec<LeagueEntry>>,
) -> (ValidationStatus, Option<LeagueEntry>, String) {
    if let Some(entries) = index.get(&normalize_name(&player.name)) {
        if let Some(hit) = entries.iter().find(|e| e.canonical_team == player.team) {
            return (ValidationStatus::Clean, Some(hit.clone()), "Matched".to_string());
        }
        if let Some(first) = entries.first() {
            let detail = format!(
                "team '{}' != league team '{}' (raw '{}')",
                player.team, first.canonical_team, first.raw_team
            );
            return (ValidationStatus::MismatchConfirmed, Some(first.clone()), detail);
        }
    }

    let parts: Vec<&str> = player.name.split_whitespace().collect();
    if parts.len() >= 2 {
        let last = normalize_name(parts[parts.len() - 1]);
        let candidates: Vec<&LeagueEntry> = index
            .iter()
            .filter(|(key, _)| key.split_whitespace().last() == Some(last.as_str()))
            .flat_map(|(_, entries)| entries.iter())
            .filter(|e| e.canonical_team == player.team)
            .collect();
        if let [only] = candidates.as_slice() {
            let detail = format!("last name match: '{}' ~ '{}'", player.name, only.name);
            return (ValidationStatus::NameMismatch, Some((*only).clone()), detail);
        }
    }

    (
        ValidationStatus::NotInLeague,
        None,
        "Not found in rosters or free-agent pool".to_string(),
    )
}

/// Look up every statistics-population player on the roster platform.
///
/// A player found nowhere whose team is outside `expected_teams` is
/// reported as a confirmed mismatch: the record likely leaked in from a
/// non-conference school with a similar name.
pub fn validate_players(
    players: &[PlayerSeasonStat],
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
    free_agents: &[RosterEntry],
    teams: &TeamNameMap,
    expected_teams: &BTreeSet<String>,
) -> ValidationReport {
    let index = league_index(rosters, free_agents, teams);
    let mut counts: BTreeMap<ValidationStatus, usize> = BTreeMap::new();
    let mut results = Vec::with_capacity(players.len());

    for player in players {
        let (mut status, league_match, mut detail) = find_in_league(player, &index);
        if status == ValidationStatus::NotInLeague && !expected_teams.contains(&player.team) {
            status = ValidationStatus::MismatchConfirmed;
            detail = format!("team '{}' is not a conference school", player.team);
        }
        *counts.entry(status).or_insert(0) += 1;
        results.push(PlayerValidation {
            name: player.name.clone(),
            team: player.team.clone(),
            games: player.games,
            status,
            detail,
            league_match,
        });
    }

    let foreign_teams = players
        .iter()
        .filter(|p| !expected_teams.contains(&p.team))
        .map(|p| p.team.clone())
        .collect();
    let clean = counts.get(&ValidationStatus::Clean).copied().unwrap_or(0);
    let clean_pct = if players.is_empty() {
        0.0
    } else {
        crate::category::round_to(clean as f64 / players.len() as f64 * 100.0, 1)
    };

    ValidationReport {
        results,
        counts,
        foreign_teams,
        clean_pct,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{PeriodStandings, StandingsCell, StandingsRow};
    use crate::identity::ManualOverrides;
    use crate::schedule::PeriodSchedule;

    fn consistent(name: &str, team: &str, games: u32) -> PlayerSeasonStat {
        PlayerSeasonStat {
            name: name.into(),
            team: team.into(),
            games,
            total_minutes: games as f64 * 20.0,
            fgm: 40,
            fga: 90,
            tpm: 10,
            ftm: 15,
            fta: 20,
            pts: 2 * 30 + 3 * 10 + 15,
            ..Default::default()
        }
    }

    fn full_population() -> Vec<PlayerSeasonStat> {
        let exp = QualityExpectations::default();
        let mut players = Vec::new();
        for team in &exp.expected_teams {
            for i in 0..15 {
                players.push(consistent(&format!("{team} Player{i}"), team, 10));
            }
        }
        players
    }

    #[test]
    fn clean_population_passes() {
        let report = run_player_quality(&full_population(), &QualityExpectations::default());
        assert!(report.all_passed(), "{:?}", report.failures().collect::<Vec<_>>());
        // 8 global checks plus one per team.
        assert_eq!(report.checks.len(), 8 + 14);
        assert_eq!(report.summary(), "22/22 checks passed");
    }

    #[test]
    fn detects_inconsistent_records() {
        let mut players = full_population();
        players[0].fgm = 100; // more makes than attempts, and points no longer add up
        players[1].reb = -2;
        players[2].total_minutes = 500.0; // 50 mpg
        let report = run_player_quality(&players, &QualityExpectations::default());
        let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
        assert!(failed.contains(&"FGM <= FGA for all players"));
        assert!(failed.contains(&"No negative stat values"));
        assert!(failed.contains(&"PTS = 2*(FGM-3PM) + 3*3PM + FTM"));
        assert!(failed.contains(&"MPG <= 45 for all players"));
        assert!(!failed.contains(&"FTM <= FTA for all players"));
    }

    #[test]
    fn missing_team_and_thin_roster_fail() {
        let players: Vec<PlayerSeasonStat> = full_population()
            .into_iter()
            .filter(|p| p.team != "VCU")
            .collect();
        let report = run_player_quality(&players, &QualityExpectations::default());
        let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
        assert!(failed.contains(&"All 14 teams present"));
        assert!(failed.contains(&"VCU: 5+ qualified players"));
    }

    #[test]
    fn roster_match_rate() {
        let players = vec![consistent("Known Player", "VCU", 10)];
        let teams = TeamNameMap::default();
        let overrides = ManualOverrides::empty();
        let resolver = Resolver::new(&players, &teams, &overrides);
        let mut rosters = BTreeMap::new();
        rosters.insert(
            "Ours".to_string(),
            vec![
                RosterEntry::new("Known Player", "VCU"),
                RosterEntry::new("Ghost", "VCU"),
            ],
        );
        let report = run_roster_match_quality(&resolver, &rosters, &QualityExpectations::default());
        assert!(!report.all_passed());
        assert_eq!(report.checks[0].detail, "1/2 matched | Unmatched: Ghost (VCU)");
        assert_eq!(report.checks[1].detail, "1/2 (50.0%)");
    }

    #[test]
    fn schedule_requires_periods_and_teams() {
        let exp = QualityExpectations {
            required_periods: vec![14, 15],
            min_scheduled_teams: 2,
            ..Default::default()
        };
        let mut p14 = PeriodSchedule::default();
        p14.games_per_team.insert("VCU".into(), 2);
        p14.games_per_team.insert("Dayton".into(), 1);
        p14.games_per_team.insert("Gonzaga".into(), 3);
        let mut schedule = LeagueSchedule::new();
        schedule.insert(14, p14);
        let report = run_schedule_quality(&schedule, &exp);
        let outcome: Vec<(String, bool)> = report
            .checks
            .iter()
            .map(|c| (c.name.clone(), c.passed))
            .collect();
        assert_eq!(
            outcome,
            vec![
                ("Period 14 present".to_string(), true),
                ("Period 14: conference teams scheduled".to_string(), true),
                ("Period 15 present".to_string(), false),
            ]
        );
    }

    #[test]
    fn matchup_records_must_total_nine() {
        let row = |name: &str, w: f64, l: f64, t: f64| {
            let mut cells = BTreeMap::new();
            cells.insert("W".to_string(), Some(StandingsCell::Number(w)));
            cells.insert("L".to_string(), Some(StandingsCell::Number(l)));
            cells.insert("T".to_string(), Some(StandingsCell::Text(t.to_string())));
            StandingsRow {
                team_name: name.into(),
                cells,
            }
        };
        let mut history = MatchupHistory::default();
        history.insert(
            1,
            PeriodStandings {
                rows: vec![row("A", 5.0, 4.0, 0.0), row("B", 4.0, 4.0, 0.0)],
            },
        );
        let exp = QualityExpectations {
            min_history_periods: 1,
            league_teams: 2,
            ..Default::default()
        };
        let report = run_matchup_quality(&history, &exp);
        assert!(report.checks[0].passed);
        assert!(report.checks[1].passed);
        assert!(!report.checks[2].passed);
        assert!(report.checks[2].detail.contains("P1 B: 4W-4L-0T"));
    }

    #[test]
    fn cross_reference_statuses() {
        let exp = QualityExpectations::default();
        let teams = TeamNameMap::default();
        let players = vec![
            consistent("Clean Player", "VCU", 10),
            consistent("Moved Player", "Dayton", 10),
            consistent("Jonathan Nickname", "Fordham", 10),
            consistent("Nowhere Man", "Richmond", 10),
            consistent("Leaked Player", "Loyola Maryland", 10),
        ];
        let mut rosters = BTreeMap::new();
        rosters.insert(
            "Ours".to_string(),
            vec![
                RosterEntry::new("Clean Player", "VCU Rams"),
                RosterEntry::new("Moved Player", "URI"),
            ],
        );
        let free_agents = vec![RosterEntry::new("Jon Nickname", "Ford")];

        let report = validate_players(&players, &rosters, &free_agents, &teams, &exp.expected_teams);
        let statuses: Vec<ValidationStatus> = report.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ValidationStatus::Clean,
                ValidationStatus::MismatchConfirmed,
                ValidationStatus::NameMismatch,
                ValidationStatus::NotInLeague,
                ValidationStatus::MismatchConfirmed,
            ]
        );
        assert_eq!(
            report.results[0].league_match.as_ref().unwrap().fantasy_team.as_deref(),
            Some("Ours")
        );
        assert_eq!(report.results[2].league_match.as_ref().unwrap().fantasy_team, None);
        assert_eq!(report.count(ValidationStatus::MismatchConfirmed), 2);
        assert_eq!(report.issues().count(), 4);
        assert_eq!(
            report.foreign_teams,
            BTreeSet::from(["Loyola Maryland".to_string()])
        );
        assert_eq!(report.clean_pct, 20.0);
    }

    #[test]
    fn extreme_counts_fail_checks_without_overflow() {
        let mut players = full_population();
        players[0].fgm = 2_000_000_000;
        players[0].fga = 2_000_000_000;
        let report = run_player_quality(&players, &QualityExpectations::default());
        let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
        assert_eq!(failed, vec!["PTS = 2*(FGM-3PM) + 3*3PM + FTM"]);

        let mut cells = BTreeMap::new();
        cells.insert("W".to_string(), Some(StandingsCell::Text("4294967295".into())));
        cells.insert("L".to_string(), Some(StandingsCell::Text("1".into())));
        let mut history = MatchupHistory::default();
        history.insert(
            1,
            PeriodStandings {
                rows: vec![StandingsRow {
                    team_name: "A".into(),
                    cells,
                }],
            },
        );
        let exp = QualityExpectations {
            min_history_periods: 1,
            league_teams: 1,
            ..Default::default()
        };
        let report = run_matchup_quality(&history, &exp);
        assert!(!report.checks[2].passed);
        assert!(report.checks[2].detail.contains("P1 A: 4294967295W-1L-0T"));
    }
}

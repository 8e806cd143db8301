// Free-agent analysis and roster-move simulation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::category::{round_to, Category, CategoryMap};
use crate::composite::{composite_z_score, schedule_adjusted_composite, CategoryWeights};
use crate::identity::{Resolution, Resolver};
use crate::lineup::{trim_games_to_cap, OpenDay};
use crate::line::CategoryLine;
use crate::matchup::{compare_categories, MatchupResult};
use crate::projection::{project_team_week, TeamProjection};
use crate::schedule::{games_in_period, PeriodId, PeriodSchedule};
use crate::stats::{PlayerSeasonStat, RosterEntry};
use crate::zscore::ZScoreRow;

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// ---------------------------------------------------------------------------
// Free-agent pool
// ---------------------------------------------------------------------------

/// Population indices of every player resolved from any fantasy roster.
pub fn rostered_indices(
    resolver: &Resolver<'_>,
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
) -> HashSet<usize> {
    rosters
        .values()
        .flatten()
        .filter_map(|entry| match resolver.resolve_entry(entry) {
            Resolution::Matched { index, .. } => Some(index),
            Resolution::Unmatched => None,
        })
        .collect()
}

/// Statistics-population players not on any fantasy roster.
pub fn free_agent_pool(
    resolver: &Resolver<'_>,
    rosters: &BTreeMap<String, Vec<RosterEntry>>,
) -> Vec<PlayerSeasonStat> {
    let rostered = rostered_indices(resolver, rosters);
    let pool: Vec<PlayerSeasonStat> = resolver
        .players()
        .iter()
        .enumerate()
        .filter(|(i, _)| !rostered.contains(i))
        .map(|(_, p)| p.clone())
        .collect();
    debug!(
        "free-agent pool: {} players ({} rostered)",
        pool.len(),
        rostered.len()
    );
    pool
}

/// Resolve an explicit free-agent list from the roster platform. Entries
/// that do not resolve are dropped.
pub fn free_agents_from_list(resolver: &Resolver<'_>, entries: &[RosterEntry]) -> Vec<PlayerSeasonStat> {
    entries
        .iter()
        .filter_map(|entry| resolver.resolve_entry(entry).player().cloned())
        .collect()
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// A scored player with composite values for one period.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPlayer {
    pub name: String,
    pub team: String,
    pub games: u32,
    pub mpg: f64,
    pub composite: f64,
    pub schedule_adjusted: f64,
    /// Games the player's team plays in the period.
    pub period_games: u32,
    pub z: CategoryMap<Option<f64>>,
    pub line: CategoryLine,
}

/// Inputs shared by the period-aware ranking helpers.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub schedule: &'a PeriodSchedule,
    pub baseline_games: f64,
    pub weights: &'a CategoryWeights,
}

impl RankingContext<'_> {
    pub fn rank(&self, row: &ZScoreRow) -> RankedPlayer {
        let period_games = self.schedule.games_for(&row.team);
        RankedPlayer {
            name: row.name.clone(),
            team: row.team.clone(),
            games: row.games,
            mpg: row.mpg,
            composite: composite_z_score(&row.z, self.weights),
            schedule_adjusted: schedule_adjusted_composite(
                &row.z,
                period_games,
                self.baseline_games,
                self.weights,
            ),
            period_games,
            z: row.z,
            line: row.line.clone(),
        }
    }
}

/// Rank scored players for a period.
///
/// Without a focus category the order is schedule-adjusted composite,
/// highest first. With one, it is that category's z-score, with players
/// lacking a score last.
pub fn rank_players(
    rows: &[ZScoreRow],
    ctx: &RankingContext<'_>,
    focus: Option<Category>,
) -> Vec<RankedPlayer> {
    let mut ranked: Vec<RankedPlayer> = rows.iter().map(|r| ctx.rank(r)).collect();
    match focus {
        None => ranked.sort_by(|a, b| by_score_desc(a.schedule_adjusted, b.schedule_adjusted)),
        Some(cat) => ranked.sort_by(|a, b| match (a.z[cat], b.z[cat]) {
            (Some(x), Some(y)) => by_score_desc(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
    ranked
}

/// Top `n` players by one category's z-score. Players without a score are
/// excluded.
pub fn best_available(rows: &[ZScoreRow], cat: Category, n: usize) -> Vec<&ZScoreRow> {
    let mut scored: Vec<&ZScoreRow> = rows.iter().filter(|r| r.z(cat).is_some()).collect();
    scored.sort_by(|a, b| by_score_desc(a.z(cat).unwrap_or(0.0), b.z(cat).unwrap_or(0.0)));
    scored.truncate(n);
    scored
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpgradeVerdict {
    /// More than one full composite point better.
    Clear,
    Marginal,
    NoUpgrade,
}

impl UpgradeVerdict {
    fn from_gain(gain: f64) -> Self {
        if gain > 1.0 {
            UpgradeVerdict::Clear
        } else if gain > 0.0 {
            UpgradeVerdict::Marginal
        } else {
            UpgradeVerdict::NoUpgrade
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeRow {
    pub current: String,
    pub current_composite: f64,
    pub best_free_agent: String,
    pub free_agent_composite: f64,
    pub gain: f64,
    pub verdict: UpgradeVerdict,
}

/// Compare each rostered player with the single best free agent by
/// composite. Sorted by gain, largest first. Empty without free agents.
pub fn roster_upgrades(
    roster: &[ZScoreRow],
    free_agents: &[ZScoreRow],
    weights: &CategoryWeights,
) -> Vec<UpgradeRow> {
    let best = free_agents
        .iter()
        .map(|r| (r, composite_z_score(&r.z, weights)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let Some((best, best_composite)) = best else {
        return Vec::new();
    };

    let mut rows: Vec<UpgradeRow> = roster
        .iter()
        .map(|r| {
            let current = composite_z_score(&r.z, weights);
            let gain = round_to(best_composite - current, 2);
            UpgradeRow {
                current: r.name.clone(),
                current_composite: current,
                best_free_agent: best.name.clone(),
                free_agent_composite: best_composite,
                gain,
                verdict: UpgradeVerdict::from_gain(gain),
            }
        })
        .collect();
    rows.sort_by(|a, b| by_score_desc(a.gain, b.gain));
    rows
}

// ---------------------------------------------------------------------------
// Swap simulation
// ---------------------------------------------------------------------------

/// Players to drop (by statistics-system name) and players to add.
#[derive(Debug, Clone, Default)]
pub struct SwapPlan {
    pub drop: Vec<String>,
    pub add: Vec<PlayerSeasonStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Impact {
    Better,
    Worse,
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDelta {
    pub category: Category,
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub impact: Impact,
}

impl CategoryDelta {
    fn new(category: Category, before: f64, after: f64) -> Self {
        let change = after - before;
        let impact = if category.beats(after, before) {
            Impact::Better
        } else if category.beats(before, after) {
            Impact::Worse
        } else {
            Impact::Unchanged
        };
        CategoryDelta {
            category,
            before,
            after,
            change,
            impact,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapResult {
    pub before: TeamProjection,
    pub after: TeamProjection,
    pub deltas: Vec<CategoryDelta>,
    /// Drop names that matched no rostered line.
    pub missing_drops: Vec<String>,
    pub matchup_before: Option<MatchupResult>,
    pub matchup_after: Option<MatchupResult>,
}

/// Per-period settings for a swap simulation.
#[derive(Debug, Clone, Copy)]
pub struct SwapContext<'a> {
    pub schedule: &'a PeriodSchedule,
    pub period: PeriodId,
    pub team_name: &'a str,
    /// When set, both projections are trimmed to this many games.
    pub gp_cap: Option<u32>,
    pub opponent: Option<&'a TeamProjection>,
}

fn period_games(
    lines: &[CategoryLine],
    ctx: &SwapContext<'_>,
) -> HashMap<String, u32> {
    let games = games_in_period(lines, ctx.schedule);
    match ctx.gp_cap {
        Some(cap) => trim_games_to_cap(lines, &games, cap),
        None => games,
    }
}

/// Re-project a roster after dropping and adding players.
pub fn simulate_swap(lines: &[CategoryLine], plan: &SwapPlan, ctx: &SwapContext<'_>) -> SwapResult {
    let missing_drops: Vec<String> = plan
        .drop
        .iter()
        .filter(|name| !lines.iter().any(|l| &l.name == *name))
        .cloned()
        .collect();

    let mut swapped: Vec<CategoryLine> = lines
        .iter()
        .filter(|l| !plan.drop.contains(&l.name))
        .cloned()
        .collect();
    swapped.extend(plan.add.iter().map(CategoryLine::from_stat));

    let before = project_team_week(lines, &period_games(lines, ctx), ctx.period, ctx.team_name);
    let after = project_team_week(&swapped, &period_games(&swapped, ctx), ctx.period, ctx.team_name);

    let deltas = Category::ALL
        .iter()
        .map(|&cat| CategoryDelta::new(cat, before.total(cat), after.total(cat)))
        .collect();

    let (matchup_before, matchup_after) = match ctx.opponent {
        Some(opp) => (
            Some(compare_categories(&before, opp)),
            Some(compare_categories(&after, opp)),
        ),
        None => (None, None),
    };

    SwapResult {
        before,
        after,
        deltas,
        missing_drops,
        matchup_before,
        matchup_after,
    }
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StreamCandidate {
    pub name: String,
    pub team: String,
    pub composite: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamingDay {
    pub date: NaiveDate,
    pub open_slots: usize,
    pub candidates: Vec<StreamCandidate>,
}

/// For each open day, the top `n` free agents whose team plays that day.
pub fn streaming_candidates(
    open_days: &[OpenDay],
    schedule: &PeriodSchedule,
    free_agents: &[ZScoreRow],
    weights: &CategoryWeights,
    n: usize,
) -> Vec<StreamingDay> {
    open_days
        .iter()
        .map(|day| {
            let mut candidates: Vec<StreamCandidate> = free_agents
                .iter()
                .filter(|r| schedule.plays_on(&r.team, day.date))
                .map(|r| StreamCandidate {
                    name: r.name.clone(),
                    team: r.team.clone(),
                    composite: composite_z_score(&r.z, weights),
                })
                .collect();
            candidates.sort_by(|a, b| by_score_desc(a.composite, b.composite));
            candidates.truncate(n);
            StreamingDay {
                date: day.date,
                open_slots: day.open_slots,
                candidates,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ManualOverrides, TeamNameMap};
    use crate::zscore::{compute_z_scores, PoolFilter, VolumeGates};

    fn stat(name: &str, team: &str, ppg: i32, reb: i32, to: i32) -> PlayerSeasonStat {
        PlayerSeasonStat {
            name: name.into(),
            team: team.into(),
            games: 10,
            total_minutes: 250.0,
            fgm: 50,
            fga: 100,
            tpm: 10,
            ftm: 20,
            fta: 25,
            pts: ppg * 10,
            reb: reb * 10,
            to: to * 10,
            ..Default::default()
        }
    }

    fn population() -> Vec<PlayerSeasonStat> {
        vec![
            stat("Rostered Star", "VCU", 20, 6, 2),
            stat("Rostered Role", "Dayton", 8, 3, 1),
            stat("Free Scorer", "Fordham", 18, 4, 3),
            stat("Free Big", "Richmond", 6, 10, 1),
            stat("Free Guard", "VCU", 10, 2, 2),
        ]
    }

    fn rosters() -> BTreeMap<String, Vec<RosterEntry>> {
        let mut r = BTreeMap::new();
        r.insert(
            "Ours".to_string(),
            vec![
                RosterEntry::new("Rostered Star", "VCU Rams"),
                RosterEntry::new("Rostered Role", "Dayt"),
            ],
        );
        r
    }

    fn schedule() -> PeriodSchedule {
        let mut s = PeriodSchedule::default();
        let d = |day| NaiveDate::from_ymd_opt(2026, 2, day).unwrap();
        for (team, days) in [
            ("VCU", vec![d(10), d(12)]),
            ("Dayton", vec![d(11)]),
            ("Fordham", vec![d(10), d(11), d(13)]),
            ("Richmond", vec![d(12)]),
        ] {
            s.games_per_team.insert(team.into(), days.len() as u32);
            s.game_dates_per_team.insert(team.into(), days);
        }
        s
    }

    #[test]
    fn pool_excludes_rostered_players() {
        let players = population();
        let teams = TeamNameMap::default();
        let overrides = ManualOverrides::empty();
        let resolver = Resolver::new(&players, &teams, &overrides);
        let pool = free_agent_pool(&resolver, &rosters());
        let names: Vec<&str> = pool.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Free Scorer", "Free Big", "Free Guard"]);
    }

    #[test]
    fn explicit_list_resolves_entries() {
        let players = population();
        let teams = TeamNameMap::default();
        let overrides = ManualOverrides::empty();
        let resolver = Resolver::new(&players, &teams, &overrides);
        let list = vec![
            RosterEntry::new("Free Big", "Rich"),
            RosterEntry::new("Unknown Person", "Rich"),
        ];
        let fas = free_agents_from_list(&resolver, &list);
        assert_eq!(fas.len(), 1);
        assert_eq!(fas[0].name, "Free Big");
    }

    #[test]
    fn ranking_rewards_extra_games() {
        let players = population();
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        let sched = schedule();
        let weights = CategoryWeights::uniform();
        let ctx = RankingContext {
            schedule: &sched,
            baseline_games: 2.0,
            weights: &weights,
        };
        let ranked = rank_players(&rows, &ctx, None);
        for pair in ranked.windows(2) {
            assert!(pair[0].schedule_adjusted >= pair[1].schedule_adjusted);
        }
        let scorer = ranked.iter().find(|r| r.name == "Free Scorer").unwrap();
        assert_eq!(scorer.period_games, 3);

        let by_reb = rank_players(&rows, &ctx, Some(Category::Rebounds));
        assert_eq!(by_reb[0].name, "Free Big");
    }

    #[test]
    fn best_available_skips_unscored() {
        let mut players = population();
        players[4].fta = 0;
        players[4].ftm = 0;
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        let top = best_available(&rows, Category::FtPct, 10);
        assert_eq!(top.len(), 4);
        let top_pts = best_available(&rows, Category::Points, 2);
        assert_eq!(top_pts[0].name, "Rostered Star");
        assert_eq!(top_pts[1].name, "Free Scorer");
    }

    #[test]
    fn upgrades_compare_against_best_free_agent() {
        let players = population();
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        let (roster, fas): (Vec<ZScoreRow>, Vec<ZScoreRow>) =
            rows.into_iter().partition(|r| r.name.starts_with("Rostered"));
        let weights = CategoryWeights::uniform();
        let upgrades = roster_upgrades(&roster, &fas, &weights);
        assert_eq!(upgrades.len(), 2);
        assert!(upgrades[0].gain >= upgrades[1].gain);
        assert_eq!(upgrades[0].current, "Rostered Role");
        assert!(roster_upgrades(&roster, &[], &weights).is_empty());
    }

    #[test]
    fn swap_reports_deltas_with_turnover_polarity() {
        let players = population();
        let lines: Vec<CategoryLine> = players[..2].iter().map(CategoryLine::from_stat).collect();
        let sched = schedule();
        let ctx = SwapContext {
            schedule: &sched,
            period: 15,
            team_name: "Ours",
            gp_cap: None,
            opponent: None,
        };
        let plan = SwapPlan {
            drop: vec!["Rostered Role".into(), "Not On Roster".into()],
            add: vec![players[2].clone()],
        };
        let result = simulate_swap(&lines, &plan, &ctx);
        assert_eq!(result.missing_drops, vec!["Not On Roster".to_string()]);
        // Role: 8 ppg x 1 game. Scorer: 18 ppg x 3 games.
        let pts = result.deltas.iter().find(|d| d.category == Category::Points).unwrap();
        assert_eq!(pts.before, 40.0 + 8.0);
        assert_eq!(pts.after, 40.0 + 54.0);
        assert_eq!(pts.impact, Impact::Better);
        // Turnovers rise from 4 + 1 to 4 + 9: worse.
        let to = result.deltas.iter().find(|d| d.category == Category::Turnovers).unwrap();
        assert_eq!(to.impact, Impact::Worse);
        assert!(result.matchup_before.is_none());
    }

    #[test]
    fn swap_with_cap_and_opponent() {
        let players = population();
        let lines: Vec<CategoryLine> = players[..2].iter().map(CategoryLine::from_stat).collect();
        let sched = schedule();
        let opp_lines = vec![CategoryLine::from_stat(&players[3])];
        let opp = project_team_week(
            &opp_lines,
            &games_in_period(&opp_lines, &sched),
            15,
            "Them",
        );
        let ctx = SwapContext {
            schedule: &sched,
            period: 15,
            team_name: "Ours",
            gp_cap: Some(3),
            opponent: Some(&opp),
        };
        let plan = SwapPlan {
            drop: Vec::new(),
            add: vec![players[2].clone()],
        };
        let result = simulate_swap(&lines, &plan, &ctx);
        assert!(result.before.games_used() <= 3);
        assert!(result.after.games_used() <= 3);
        let after = result.matchup_after.unwrap();
        assert_eq!(after.wins_a + after.wins_b + after.ties, 9);
    }

    #[test]
    fn streaming_lists_free_agents_playing_on_open_days() {
        let players = population();
        let rows = compute_z_scores(&players[2..], &PoolFilter::default(), &VolumeGates::default());
        let sched = schedule();
        let open = vec![OpenDay {
            date: NaiveDate::from_ymd_opt(2026, 2, 12).unwrap(),
            open_slots: 2,
        }];
        let days = streaming_candidates(&open, &sched, &rows, &CategoryWeights::uniform(), 5);
        let names: HashSet<&str> = days[0].candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["Free Big", "Free Guard"]));
        assert_eq!(days[0].open_slots, 2);
    }
}

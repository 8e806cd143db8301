// Command orchestration: binds the loaded config and snapshots to the
// engine operations each report needs.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{anyhow, bail};
use courtcast_core::boxscore::aggregate_box_scores;
use courtcast_core::category::Category;
use courtcast_core::composite::{composite_z_score, CategoryWeights};
use courtcast_core::history::{team_category_ranks, team_historical_cats, TeamPeriodLine};
use courtcast_core::identity::{
    normalize_name, resolve_roster, ManualOverrides, Resolver, RosterResolution, TeamNameMap,
};
use courtcast_core::lineup::{
    gp_budget, open_streaming_days, optimize_lineup, project_with_lineup, GpBudget, LineupLimits,
    LineupPlan,
};
use courtcast_core::matchup::{predict_matchup, MatchupResult};
use courtcast_core::projection::{project_all_teams, TeamProjection};
use courtcast_core::quality::{
    run_matchup_quality, run_player_quality, run_roster_match_quality, run_schedule_quality,
    validate_players, DataQualityReport, QualityExpectations, ValidationReport,
};
use courtcast_core::schedule::{PeriodId, PeriodSchedule};
use courtcast_core::stats::{PlayerSeasonStat, RosterEntry};
use courtcast_core::waiver::{
    best_available, free_agent_pool, free_agents_from_list, rank_players, roster_upgrades,
    simulate_swap, streaming_candidates, RankedPlayer, RankingContext, StreamingDay, SwapContext,
    SwapPlan, SwapResult, UpgradeRow,
};
use courtcast_core::zscore::{compute_z_scores, ZScoreRow};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub period: PeriodId,
    pub focus: Option<Category>,
    pub free_agents_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupReport {
    pub period: PeriodId,
    pub mine: TeamProjection,
    pub opponent: TeamProjection,
    pub result: MatchupResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupReport {
    pub period: PeriodId,
    pub budget: GpBudget,
    pub plan: LineupPlan,
    pub projection: TeamProjection,
    pub streaming: Vec<StreamingDay>,
    /// Roster entries with no statistics record; they are left out.
    pub unmatched: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateReport {
    pub quality: DataQualityReport,
    pub cross_reference: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub team: String,
    pub lines: Vec<TeamPeriodLine>,
    pub rank_period: Option<PeriodId>,
    pub ranks: BTreeMap<String, courtcast_core::CategoryMap<u32>>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One run's view of the league: a statistics population (season or a
/// recent-games window) plus the identity tables to resolve rosters with.
pub struct Engine<'a> {
    config: &'a Config,
    snapshot: &'a Snapshot,
    players: Vec<PlayerSeasonStat>,
    teams: TeamNameMap,
    overrides: ManualOverrides,
}

impl<'a> Engine<'a> {
    /// With `recent_games`, the population is each player's last N games
    /// aggregated from box scores instead of the season snapshot.
    pub fn new(
        config: &'a Config,
        snapshot: &'a Snapshot,
        recent_games: Option<usize>,
    ) -> anyhow::Result<Self> {
        let players = match recent_games {
            None => snapshot.players.clone(),
            Some(0) => bail!("a recent-games window needs at least one game"),
            Some(n) => {
                if snapshot.box_scores.is_empty() {
                    bail!("no box scores loaded; cannot build a last-{n} game window");
                }
                let players = aggregate_box_scores(&snapshot.box_scores, Some(n));
                info!("using last-{} game window: {} players", n, players.len());
                players
            }
        };
        Ok(Engine {
            config,
            snapshot,
            players,
            teams: config.team_name_map(),
            overrides: config.manual_overrides(),
        })
    }

    pub fn players(&self) -> &[PlayerSeasonStat] {
        &self.players
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.players, &self.teams, &self.overrides)
    }

    fn weights(&self) -> &CategoryWeights {
        &self.config.strategy.weights
    }

    fn my_team(&self) -> &str {
        &self.config.league.team
    }

    pub fn period(&self, id: PeriodId) -> anyhow::Result<&'a PeriodSchedule> {
        self.snapshot
            .schedule
            .period(id)
            .ok_or_else(|| anyhow!("no schedule loaded for period {id}"))
    }

    /// The period containing today, else the last configured one.
    pub fn default_period(&self) -> anyhow::Result<PeriodId> {
        let today = chrono::Local::now().date_naive();
        self.config
            .period_containing(today)
            .or_else(|| self.config.period_ids().last().copied())
            .ok_or_else(|| anyhow!("no scoring periods configured"))
    }

    fn roster(&self, team: &str) -> anyhow::Result<&'a [RosterEntry]> {
        self.snapshot
            .rosters
            .get(team)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("fantasy team '{team}' not found in rosters"))
    }

    pub fn my_roster(&self) -> anyhow::Result<RosterResolution> {
        let roster = self.roster(self.my_team())?;
        let resolution = resolve_roster(&self.resolver(), roster);
        for entry in &resolution.unmatched {
            warn!("roster player '{}' ({}) has no statistics record", entry.name, entry.team);
        }
        Ok(resolution)
    }

    /// The platform's free-agent list when one was loaded, otherwise every
    /// population player not on a fantasy roster.
    pub fn free_agents(&self) -> Vec<PlayerSeasonStat> {
        let resolver = self.resolver();
        if self.snapshot.free_agents.is_empty() {
            free_agent_pool(&resolver, &self.snapshot.rosters)
        } else {
            free_agents_from_list(&resolver, &self.snapshot.free_agents)
        }
    }

    fn free_agent_rows(&self) -> Vec<ZScoreRow> {
        compute_z_scores(
            &self.free_agents(),
            &self.config.strategy.free_agent_pool,
            &self.config.strategy.gates,
        )
    }

    // -- Rankings --

    pub fn rankings(&self, opts: &RankingOptions) -> anyhow::Result<Vec<RankedPlayer>> {
        let schedule = self.period(opts.period)?;
        let strategy = &self.config.strategy;
        let rows = if opts.free_agents_only {
            self.free_agent_rows()
        } else {
            compute_z_scores(&self.players, &strategy.scoring_pool, &strategy.gates)
        };
        let ctx = RankingContext {
            schedule,
            baseline_games: strategy.baseline_games,
            weights: &strategy.weights,
        };
        let mut ranked = rank_players(&rows, &ctx, opts.focus);
        if let Some(n) = opts.limit {
            ranked.truncate(n);
        }
        Ok(ranked)
    }

    /// Top `n` free agents by one category.
    pub fn best_available(&self, cat: Category, n: usize) -> Vec<ZScoreRow> {
        let rows = self.free_agent_rows();
        best_available(&rows, cat, n).into_iter().cloned().collect()
    }

    // -- Projections --

    pub fn projections(&self, period: PeriodId) -> anyhow::Result<BTreeMap<String, TeamProjection>> {
        let schedule = self.period(period)?;
        Ok(project_all_teams(
            &self.resolver(),
            &self.snapshot.rosters,
            schedule,
            period,
        ))
    }

    pub fn matchup(&self, period: PeriodId, opponent: &str) -> anyhow::Result<MatchupReport> {
        if opponent == self.my_team() {
            bail!("opponent must differ from your own team");
        }
        let mut all = self.projections(period)?;
        let mine = all
            .remove(self.my_team())
            .ok_or_else(|| anyhow!("fantasy team '{}' not found in rosters", self.my_team()))?;
        let theirs = all
            .remove(opponent)
            .ok_or_else(|| anyhow!("opponent '{opponent}' not found in rosters"))?;
        let result = predict_matchup(&mine, &theirs);
        info!("period {} matchup projected: {}", period, result);
        Ok(MatchupReport {
            period,
            mine,
            opponent: theirs,
            result,
        })
    }

    // -- Lineup --

    /// Start/sit plan for the user's roster, valued by composite z-score
    /// within the roster, plus streaming options for open days.
    pub fn lineup(&self, period: PeriodId, stream_n: usize) -> anyhow::Result<LineupReport> {
        let schedule = self.period(period)?;
        let roster = self.my_roster()?;
        let lines = roster.lines();
        let strategy = &self.config.strategy;

        let stats: Vec<PlayerSeasonStat> = roster.matched.iter().map(|m| m.stat.clone()).collect();
        let values: HashMap<String, f64> =
            compute_z_scores(&stats, &strategy.roster_pool, &strategy.gates)
                .iter()
                .map(|r| (r.name.clone(), composite_z_score(&r.z, self.weights())))
                .collect();

        let limits = LineupLimits {
            active_slots: self.config.league.active_slots,
            gp_max: self.config.gp_max_for(period),
        };
        let plan = optimize_lineup(&lines, schedule, &values, limits);
        let projection = project_with_lineup(&plan, &lines, period, self.my_team());
        let budget = gp_budget(&lines, schedule, limits.gp_max);
        let open_days = open_streaming_days(&lines, schedule, limits.active_slots);
        let streaming = streaming_candidates(
            &open_days,
            schedule,
            &self.free_agent_rows(),
            self.weights(),
            stream_n,
        );
        info!(
            "period {} lineup: {}/{} games used, {} open days",
            period,
            plan.total_games,
            limits.gp_max,
            open_days.len()
        );

        Ok(LineupReport {
            period,
            budget,
            plan,
            projection,
            streaming,
            unmatched: roster.unmatched,
        })
    }

    // -- Waiver moves --

    /// Each rostered player against the best free agent, both scored in
    /// the same free-agent reference population.
    pub fn upgrades(&self) -> anyhow::Result<Vec<UpgradeRow>> {
        let roster = self.my_roster()?;
        let mine: HashSet<(String, String)> = roster
            .matched
            .iter()
            .map(|m| (m.stat.name.clone(), m.stat.team.clone()))
            .collect();
        let free: HashSet<(String, String)> = self
            .free_agents()
            .into_iter()
            .map(|p| (p.name, p.team))
            .collect();

        let strategy = &self.config.strategy;
        let mut roster_rows = Vec::new();
        let mut fa_rows = Vec::new();
        for row in compute_z_scores(&self.players, &strategy.free_agent_pool, &strategy.gates) {
            let key = (row.name.clone(), row.team.clone());
            if mine.contains(&key) {
                roster_rows.push(row);
            } else if free.contains(&key) {
                fa_rows.push(row);
            }
        }
        Ok(roster_upgrades(&roster_rows, &fa_rows, self.weights()))
    }

    /// Drop and add players by name and re-project the period under the
    /// games cap. Names are matched loosely (case, punctuation, suffixes).
    pub fn swap(
        &self,
        period: PeriodId,
        drop: &[String],
        add: &[String],
        opponent: Option<&str>,
    ) -> anyhow::Result<SwapResult> {
        let schedule = self.period(period)?;
        let lines = self.my_roster()?.lines();

        let drop: Vec<String> = drop
            .iter()
            .map(|name| {
                let key = normalize_name(name);
                lines
                    .iter()
                    .find(|l| normalize_name(&l.name) == key)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| name.clone())
            })
            .collect();

        let pool = self.free_agents();
        let mut adds = Vec::with_capacity(add.len());
        for name in add {
            let key = normalize_name(name);
            let found = pool
                .iter()
                .find(|p| normalize_name(&p.name) == key)
                .ok_or_else(|| anyhow!("'{name}' is not in the free-agent pool"))?;
            adds.push(found.clone());
        }

        let opponent_projection = match opponent {
            Some(name) => Some(
                self.projections(period)?
                    .remove(name)
                    .ok_or_else(|| anyhow!("opponent '{name}' not found in rosters"))?,
            ),
            None => None,
        };

        let plan = SwapPlan { drop, add: adds };
        let ctx = SwapContext {
            schedule,
            period,
            team_name: self.my_team(),
            gp_cap: Some(self.config.gp_max_for(period)),
            opponent: opponent_projection.as_ref(),
        };
        let result = simulate_swap(&lines, &plan, &ctx);
        for missing in &result.missing_drops {
            warn!("drop target '{}' is not on the roster", missing);
        }
        Ok(result)
    }

    // -- Data quality --

    pub fn expectations(&self) -> QualityExpectations {
        QualityExpectations {
            expected_teams: self
                .teams
                .canonical_teams()
                .into_iter()
                .map(String::from)
                .collect(),
            required_periods: self.config.period_ids(),
            league_teams: self.config.league.num_teams,
            ..QualityExpectations::default()
        }
    }

    pub fn validate(&self) -> ValidateReport {
        let exp = self.expectations();
        let resolver = self.resolver();

        let mut quality = run_player_quality(&self.players, &exp);
        quality.extend(run_roster_match_quality(&resolver, &self.snapshot.rosters, &exp));
        quality.extend(run_schedule_quality(&self.snapshot.schedule, &exp));
        if self.snapshot.history.is_empty() {
            info!("no matchup history loaded; skipping standings checks");
        } else {
            quality.extend(run_matchup_quality(&self.snapshot.history, &exp));
        }

        let cross_reference = validate_players(
            &self.players,
            &self.snapshot.rosters,
            &self.snapshot.free_agents,
            &self.teams,
            &exp.expected_teams,
        );
        info!(
            "validation: {}; cross-reference {}% clean",
            quality.summary(),
            cross_reference.clean_pct
        );
        ValidateReport {
            quality,
            cross_reference,
        }
    }

    // -- History --

    /// A team's past results (the user's own by default) and league-wide
    /// category ranks for one period (the latest by default).
    pub fn history(&self, team: Option<&str>, period: Option<PeriodId>) -> HistoryReport {
        let history = &self.snapshot.history;
        let team = team.unwrap_or(self.my_team()).to_string();
        HistoryReport {
            lines: team_historical_cats(history, &team),
            rank_period: period.or_else(|| history.latest_period()),
            ranks: team_category_ranks(history, period),
            team,
        }
    }
}

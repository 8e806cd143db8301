// Command-line surface: argument parsing and dispatch to the engine.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use courtcast_core::boxscore::aggregate_box_scores;
use courtcast_core::category::Category;
use courtcast_core::schedule::PeriodId;
use serde::Serialize;
use tracing::info;

use crate::config::{self, Config};
use crate::engine::{Engine, RankingOptions};
use crate::report;
use crate::snapshot;

#[derive(Debug, Parser)]
#[command(name = "courtcast")]
#[command(about = "Head-to-head 9-category fantasy basketball analytics", long_about = None)]
pub struct Cli {
    /// Directory holding config/, defaults/ and the data files
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// Print JSON instead of text tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Score each player's last N games (from box scores) instead of the season
    #[arg(long, global = true)]
    pub recent: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank players by schedule-adjusted composite z-score
    Rankings {
        /// Scoring period (defaults to the current one)
        #[arg(long)]
        period: Option<PeriodId>,
        /// Sort by one category's z-score instead
        #[arg(long)]
        category: Option<Category>,
        /// Only players not on a fantasy roster
        #[arg(long)]
        free_agents: bool,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },

    /// Top free agents in one category
    Best {
        #[arg(long)]
        category: Category,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Project every fantasy team's category totals for a period
    Project {
        #[arg(long)]
        period: Option<PeriodId>,
    },

    /// Predict your matchup against another fantasy team
    Matchup {
        #[arg(long)]
        opponent: String,
        #[arg(long)]
        period: Option<PeriodId>,
    },

    /// Day-by-day start/sit plan under the games-played cap
    Lineup {
        #[arg(long)]
        period: Option<PeriodId>,
        /// Free agents to suggest per open day
        #[arg(long, default_value_t = 3)]
        stream: usize,
    },

    /// Compare each rostered player with the best free agent
    Upgrades,

    /// Simulate dropping and adding players
    Swap {
        /// Rostered player to drop (repeatable)
        #[arg(long = "drop")]
        drop: Vec<String>,
        /// Free agent to add (repeatable)
        #[arg(long = "add")]
        add: Vec<String>,
        /// Also show the matchup before and after against this team
        #[arg(long)]
        opponent: Option<String>,
        #[arg(long)]
        period: Option<PeriodId>,
    },

    /// Run data-quality checks over the loaded snapshots
    Validate {
        /// Exit with an error if any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Aggregate box scores into per-player records
    Aggregate {
        /// Keep only each player's last N games
        #[arg(long)]
        last: Option<usize>,
        /// Write the records as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Past standings for a team and league category ranks
    History {
        /// Fantasy team (defaults to yours)
        #[arg(long)]
        team: Option<String>,
        /// Period for the rank table (defaults to the latest)
        #[arg(long)]
        period: Option<PeriodId>,
    },
}

/// What a command produced.
#[derive(Debug)]
pub struct Output {
    pub text: String,
    /// False when a strict validation found failing checks.
    pub ok: bool,
}

impl Output {
    fn ok(text: String) -> Self {
        Output { text, ok: true }
    }
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<Output> {
    if json {
        let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
        Ok(Output::ok(text))
    } else {
        Ok(Output::ok(text(value)))
    }
}

/// Load config and snapshots relative to `--base-dir` and run the command.
pub fn run(cli: &Cli) -> anyhow::Result<Output> {
    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    info!(
        "config loaded: league={}, team={}, {} periods",
        config.league.name,
        config.league.team,
        config.periods.len()
    );

    // Aggregation reads box scores only; the other snapshots may not exist yet.
    if let Command::Aggregate { last, output } = &cli.command {
        return aggregate(&config, cli.json, *last, output.as_ref());
    }

    let snapshot = snapshot::load_snapshot(&config).context("failed to load snapshots")?;
    let engine = Engine::new(&config, &snapshot, cli.recent)?;
    let period_or_default = |p: &Option<PeriodId>| match p {
        Some(p) => Ok(*p),
        None => engine.default_period(),
    };

    match &cli.command {
        Command::Rankings {
            period,
            category,
            free_agents,
            limit,
        } => {
            let period = period_or_default(period)?;
            let opts = RankingOptions {
                period,
                focus: *category,
                free_agents_only: *free_agents,
                limit: Some(*limit),
            };
            let rows = engine.rankings(&opts)?;
            emit(cli.json, rows.as_slice(), |r| report::rankings(r, period))
        }
        Command::Best { category, limit } => {
            let rows = engine.best_available(*category, *limit);
            emit(cli.json, rows.as_slice(), |r| report::best_available(r, *category))
        }
        Command::Project { period } => {
            let period = period_or_default(period)?;
            let all = engine.projections(period)?;
            emit(cli.json, &all, |a| report::projections(a, period))
        }
        Command::Matchup { opponent, period } => {
            let period = period_or_default(period)?;
            let result = engine.matchup(period, opponent)?;
            emit(cli.json, &result, report::matchup)
        }
        Command::Lineup { period, stream } => {
            let period = period_or_default(period)?;
            let result = engine.lineup(period, *stream)?;
            emit(cli.json, &result, report::lineup)
        }
        Command::Upgrades => {
            let rows = engine.upgrades()?;
            emit(cli.json, rows.as_slice(), report::upgrades)
        }
        Command::Swap {
            drop,
            add,
            opponent,
            period,
        } => {
            if drop.is_empty() && add.is_empty() {
                bail!("nothing to simulate: pass --drop and/or --add");
            }
            let period = period_or_default(period)?;
            let result = engine.swap(period, drop, add, opponent.as_deref())?;
            emit(cli.json, &result, report::swap)
        }
        Command::Validate { strict } => {
            let result = engine.validate();
            let mut out = emit(cli.json, &result, report::validate)?;
            out.ok = !*strict || result.quality.all_passed();
            Ok(out)
        }
        Command::History { team, period } => {
            let result = engine.history(team.as_deref(), *period);
            emit(cli.json, &result, report::history)
        }
        Command::Aggregate { last, output } => {
            aggregate(&config, cli.json, *last, output.as_ref())
        }
    }
}

fn aggregate(
    config: &Config,
    json: bool,
    last: Option<usize>,
    output: Option<&PathBuf>,
) -> anyhow::Result<Output> {
    let Some(rel) = &config.data_paths.box_scores else {
        bail!("no box_scores path configured in strategy.toml");
    };
    let rows = snapshot::load_box_scores(&config.data_file(rel))?;
    let players = aggregate_box_scores(&rows, last);
    info!("aggregated {} box-score rows into {} players", rows.len(), players.len());

    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &players)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    emit(json, players.as_slice(), report::players)
}

// Configuration loading and parsing (league.toml, strategy.toml).

use chrono::NaiveDate;
use courtcast_core::category::Category;
use courtcast_core::composite::CategoryWeights;
use courtcast_core::identity::{ManualOverride, ManualOverrides, TeamNameMap};
use courtcast_core::schedule::PeriodId;
use courtcast_core::zscore::{PoolFilter, VolumeGates};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the config was loaded from; relative data paths resolve
    /// against it.
    pub base_dir: PathBuf,
    pub league: LeagueConfig,
    pub periods: BTreeMap<PeriodId, PeriodConfig>,
    pub strategy: StrategyConfig,
    pub data_paths: DataPaths,
}

impl Config {
    /// Games-played cap for a period: its own override or the league default.
    pub fn gp_max_for(&self, period: PeriodId) -> u32 {
        self.periods
            .get(&period)
            .and_then(|p| p.gp_max)
            .unwrap_or(self.league.default_gp_max)
    }

    pub fn period_ids(&self) -> Vec<PeriodId> {
        self.periods.keys().copied().collect()
    }

    /// The period whose window contains `date`.
    pub fn period_containing(&self, date: NaiveDate) -> Option<PeriodId> {
        self.periods
            .iter()
            .find(|(_, p)| p.start <= date && date <= p.end)
            .map(|(id, _)| *id)
    }

    /// Built-in team aliases plus any configured ones.
    pub fn team_name_map(&self) -> TeamNameMap {
        let mut map = TeamNameMap::default();
        for (alias, canonical) in &self.strategy.identity.team_aliases {
            map.insert(alias.clone(), canonical.clone());
        }
        map
    }

    /// Built-in name overrides plus any configured ones.
    pub fn manual_overrides(&self) -> ManualOverrides {
        let mut overrides = ManualOverrides::default();
        for entry in &self.strategy.identity.overrides {
            overrides.insert(
                &entry.roster_name,
                ManualOverride {
                    name: entry.name.clone(),
                    team: entry.team.clone(),
                },
            );
        }
        overrides
    }

    /// Resolve a configured data path against the base directory.
    pub fn data_file(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    /// Keyed by period number as text (`[periods.14]`).
    #[serde(default)]
    periods: BTreeMap<String, PeriodConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// The user's fantasy team.
    pub team: String,
    /// Fantasy teams in the league.
    #[serde(default = "default_num_teams")]
    pub num_teams: usize,
    pub active_slots: usize,
    pub default_gp_max: u32,
    /// Category labels in league order. When present it must match the
    /// fixed 9-category set.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

fn default_num_teams() -> usize {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub gp_max: Option<u32>,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    pool: PoolSection,
    volume_gates: GateSection,
    schedule: ScheduleSection,
    #[serde(default)]
    category_weights: BTreeMap<String, f64>,
    data_paths: DataPaths,
    #[serde(default)]
    identity: IdentityConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct PoolSection {
    scoring: PoolThresholds,
    roster: PoolThresholds,
    free_agents: PoolThresholds,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct PoolThresholds {
    min_games: u32,
    min_mpg: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GateSection {
    min_fga_per_game: f64,
    min_fta_per_game: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleSection {
    baseline_games: f64,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Reference population for league-wide rankings.
    pub scoring_pool: PoolFilter,
    /// Population used to value the user's own roster for start/sit.
    pub roster_pool: PoolFilter,
    /// Population used to score free agents.
    pub free_agent_pool: PoolFilter,
    pub gates: VolumeGates,
    pub baseline_games: f64,
    pub weights: CategoryWeights,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Extra roster-system team spellings mapped to canonical labels.
    #[serde(default)]
    pub team_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideEntry {
    pub roster_name: String,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub rosters: String,
    pub schedule: String,
    #[serde(default)]
    pub free_agents: Option<String>,
    #[serde(default)]
    pub box_scores: Option<String>,
    #[serde(default)]
    pub matchup_history: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml` relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let mut periods = BTreeMap::new();
    for (key, period) in league_file.periods {
        let id: PeriodId = key
            .trim()
            .parse()
            .map_err(|_| invalid(format!("periods.{key}"), "period key must be a number"))?;
        periods.insert(id, period);
    }

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let weights = parse_weights(&strategy_file.category_weights)?;
    let pool = |t: PoolThresholds| PoolFilter::new(t.min_games, t.min_mpg);
    let strategy = StrategyConfig {
        scoring_pool: pool(strategy_file.pool.scoring),
        roster_pool: pool(strategy_file.pool.roster),
        free_agent_pool: pool(strategy_file.pool.free_agents),
        gates: VolumeGates {
            min_fga_pg: strategy_file.volume_gates.min_fga_per_game,
            min_fta_pg: strategy_file.volume_gates.min_fta_per_game,
        },
        baseline_games: strategy_file.schedule.baseline_games,
        weights,
        identity: strategy_file.identity,
    };

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        league: league_file.league,
        periods,
        strategy,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

fn copy_error(what: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    }
}

/// Default files worth installing: regular files that are not `.example`
/// templates, in name order so the copy log is stable.
fn installable_defaults(defaults_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(defaults_dir).map_err(|e| copy_error("read", defaults_dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| copy_error("read", defaults_dir, e))?.path();
        let is_template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_template {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write `source` to `target` unless `target` already exists.
/// Returns whether a copy happened.
fn install_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::{ErrorKind, Write};

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error("create", target, e)),
    };
    let content = std::fs::read(source).map_err(|e| copy_error("read", source, e))?;
    dest.write_all(&content).map_err(|e| copy_error("write", target, e))?;
    Ok(true)
}

/// Install league and strategy files from `defaults/` into `config/`
/// without touching files the user already has. Returns the installed
/// paths. A base dir with `config/` but no `defaults/` is left alone.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, true) => return Ok(Vec::new()),
        (false, false) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "no league configuration under {}: expected defaults/ or config/; \
                     pass --base-dir pointing at a league directory",
                    base_dir.display()
                ),
            })
        }
        _ => {}
    }
    std::fs::create_dir_all(&config_dir).map_err(|e| copy_error("create", &config_dir, e))?;

    let mut installed = Vec::new();
    for source in installable_defaults(&defaults_dir)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if install_if_missing(&source, &target)? {
            info!("installed default config {}", target.display());
            installed.push(target);
        }
    }
    Ok(installed)
}

/// Copy missing defaults into `base_dir/config/`, then load from it.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Category weights keyed by label. Unlisted categories weigh 1.0.
fn parse_weights(raw: &BTreeMap<String, f64>) -> Result<CategoryWeights, ConfigError> {
    let mut weights = CategoryWeights::uniform();
    for (label, value) in raw {
        let cat: Category = label
            .parse()
            .map_err(|e| invalid(format!("category_weights.{label}"), format!("{e}")))?;
        weights.set(cat, *value);
    }
    Ok(weights)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.team.trim().is_empty() {
        return Err(invalid("league.team", "must not be empty"));
    }
    if league.num_teams < 2 {
        return Err(invalid("league.num_teams", "must be at least 2"));
    }
    if league.active_slots == 0 {
        return Err(invalid("league.active_slots", "must be greater than 0"));
    }
    if league.default_gp_max == 0 {
        return Err(invalid("league.default_gp_max", "must be greater than 0"));
    }

    if let Some(labels) = &league.categories {
        let expected: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        let given: Vec<&str> = labels.iter().map(|s| s.trim()).collect();
        if given != expected {
            return Err(invalid(
                "league.categories",
                format!("must be {:?}, got {:?}", expected, given),
            ));
        }
    }

    for (id, period) in &config.periods {
        if period.start > period.end {
            return Err(invalid(
                format!("periods.{id}"),
                format!("start {} is after end {}", period.start, period.end),
            ));
        }
        if period.gp_max == Some(0) {
            return Err(invalid(format!("periods.{id}.gp_max"), "must be greater than 0"));
        }
    }

    let strategy = &config.strategy;
    let pools: &[(&str, &PoolFilter)] = &[
        ("pool.scoring.min_mpg", &strategy.scoring_pool),
        ("pool.roster.min_mpg", &strategy.roster_pool),
        ("pool.free_agents.min_mpg", &strategy.free_agent_pool),
    ];
    for (name, pool) in pools {
        if !(pool.min_mpg.is_finite() && pool.min_mpg >= 0.0) {
            return Err(invalid(*name, format!("must be >= 0, got {}", pool.min_mpg)));
        }
    }

    let gates: &[(&str, f64)] = &[
        ("volume_gates.min_fga_per_game", strategy.gates.min_fga_pg),
        ("volume_gates.min_fta_per_game", strategy.gates.min_fta_pg),
    ];
    for (name, val) in gates {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(invalid(*name, format!("must be >= 0, got {val}")));
        }
    }

    if !(strategy.baseline_games.is_finite() && strategy.baseline_games > 0.0) {
        return Err(invalid(
            "schedule.baseline_games",
            format!("must be > 0, got {}", strategy.baseline_games),
        ));
    }

    // Zero is allowed: it punts the category.
    for (cat, w) in strategy.weights.0.iter() {
        if !(w.is_finite() && *w >= 0.0) {
            return Err(invalid(
                format!("category_weights.{}", cat.label()),
                format!("must be >= 0, got {w}"),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

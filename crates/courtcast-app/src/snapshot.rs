// Snapshot loading: the already-fetched statistics, roster, schedule,
// box-score and standings files the engine consumes.
//
// Statistics load from JSON (an array of records) or CSV, chosen by file
// extension. Malformed records are skipped with a warning rather than
// failing the whole load.

use crate::config::Config;
use courtcast_core::boxscore::BoxScoreRow;
use courtcast_core::history::MatchupHistory;
use courtcast_core::schedule::{LeagueSchedule, PeriodSchedule};
use courtcast_core::stats::{PlayerSeasonStat, RosterEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Everything loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub players: Vec<PlayerSeasonStat>,
    pub rosters: BTreeMap<String, Vec<RosterEntry>>,
    /// Roster-platform free-agent list. Empty when not provided.
    pub free_agents: Vec<RosterEntry>,
    pub schedule: LeagueSchedule,
    pub box_scores: Vec<BoxScoreRow>,
    pub history: MatchupHistory,
}

// ---------------------------------------------------------------------------
// Raw serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRoster {
    #[serde(default)]
    players: Vec<RosterEntry>,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn trim_player(mut p: PlayerSeasonStat) -> PlayerSeasonStat {
    p.name = p.name.trim().to_string();
    p.team = p.team.trim().to_string();
    p
}

/// Decode each element of a JSON array on its own so one bad record does
/// not sink the rest.
fn records_from_json<T: DeserializeOwned, R: Read>(
    rdr: R,
    what: &str,
) -> Result<Vec<T>, serde_json::Error> {
    let raw: Vec<serde_json::Value> = serde_json::from_reader(rdr)?;
    let mut out = Vec::with_capacity(raw.len());
    for (i, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => out.push(record),
            Err(e) => warn!("skipping malformed {} record #{}: {}", what, i, e),
        }
    }
    Ok(out)
}

fn load_players_from_json<R: Read>(rdr: R) -> Result<Vec<PlayerSeasonStat>, serde_json::Error> {
    let players = records_from_json::<PlayerSeasonStat, R>(rdr, "player")?;
    Ok(keep_named(players.into_iter().map(trim_player)))
}

fn load_players_from_csv<R: Read>(rdr: R) -> Result<Vec<PlayerSeasonStat>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<PlayerSeasonStat>() {
        match result {
            Ok(p) => players.push(trim_player(p)),
            Err(e) => warn!("skipping malformed player row: {}", e),
        }
    }
    Ok(keep_named(players.into_iter()))
}

fn keep_named(players: impl Iterator<Item = PlayerSeasonStat>) -> Vec<PlayerSeasonStat> {
    players
        .filter(|p| {
            if p.name.is_empty() {
                warn!("skipping player record with no name (team '{}')", p.team);
                false
            } else {
                true
            }
        })
        .collect()
}

fn load_rosters_from_reader<R: Read>(
    rdr: R,
) -> Result<BTreeMap<String, Vec<RosterEntry>>, serde_json::Error> {
    let raw: BTreeMap<String, RawRoster> = serde_json::from_reader(rdr)?;
    Ok(raw
        .into_iter()
        .map(|(team, roster)| {
            let entries = roster
                .players
                .into_iter()
                .filter(|e| !e.name.trim().is_empty())
                .map(|e| RosterEntry::new(e.name.trim(), e.team.trim()))
                .collect();
            (team, entries)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<BufReader<File>, SnapshotError> {
    File::open(path).map(BufReader::new).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn json_err(path: &Path) -> impl FnOnce(serde_json::Error) -> SnapshotError {
    let path = path.display().to_string();
    move |e| SnapshotError::Json { path, source: e }
}

/// Load the statistics population. `.csv` files are read as CSV, anything
/// else as a JSON array.
pub fn load_players(path: &Path) -> Result<Vec<PlayerSeasonStat>, SnapshotError> {
    let file = open(path)?;
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        load_players_from_csv(file).map_err(|e| SnapshotError::Csv {
            path: path.display().to_string(),
            source: e,
        })
    } else {
        load_players_from_json(file).map_err(json_err(path))
    }
}

/// Load fantasy rosters: `{ "<fantasy team>": { "players": [ {name, team} ] } }`.
pub fn load_rosters(path: &Path) -> Result<BTreeMap<String, Vec<RosterEntry>>, SnapshotError> {
    load_rosters_from_reader(open(path)?).map_err(json_err(path))
}

/// Load the roster platform's free-agent list: `[ {name, team} ]`.
pub fn load_free_agents(path: &Path) -> Result<Vec<RosterEntry>, SnapshotError> {
    let entries = records_from_json::<RosterEntry, _>(open(path)?, "free agent").map_err(json_err(path))?;
    Ok(entries
        .into_iter()
        .filter(|e| !e.name.trim().is_empty())
        .collect())
}

/// Load the per-period schedule: `{ "<period>": { start, end, games_per_team, game_dates_per_team } }`.
pub fn load_schedule(path: &Path) -> Result<LeagueSchedule, SnapshotError> {
    serde_json::from_reader(open(path)?).map_err(json_err(path))
}

pub fn load_box_scores(path: &Path) -> Result<Vec<BoxScoreRow>, SnapshotError> {
    records_from_json(open(path)?, "box score").map_err(json_err(path))
}

/// Load past standings: `{ "<period>": { "rows": [ ... ] } }`.
pub fn load_matchup_history(path: &Path) -> Result<MatchupHistory, SnapshotError> {
    serde_json::from_reader(open(path)?).map_err(json_err(path))
}

/// Periods given only as a game list get their per-team tables built from
/// the configured window (or the period's own dates).
fn fill_from_games(schedule: &mut LeagueSchedule, config: &Config) {
    for id in schedule.period_ids() {
        let rebuilt = match schedule.period(id) {
            Some(p)
                if p.games_per_team.is_empty()
                    && p.game_dates_per_team.is_empty()
                    && !p.games.is_empty() =>
            {
                let window = config
                    .periods
                    .get(&id)
                    .map(|w| (w.start, w.end))
                    .or(p.start.zip(p.end));
                match window {
                    Some((start, end)) => PeriodSchedule::from_games(start, end, &p.games),
                    None => {
                        warn!("period {} has games but no date window; skipping", id);
                        continue;
                    }
                }
            }
            _ => continue,
        };
        schedule.insert(id, rebuilt);
    }
}

/// Load an optional file. Not configured or not present yields the default.
fn load_optional<T: Default>(
    config: &Config,
    configured: Option<&String>,
    what: &str,
    load: fn(&Path) -> Result<T, SnapshotError>,
) -> Result<T, SnapshotError> {
    let Some(rel) = configured else {
        return Ok(T::default());
    };
    let path = config.data_file(rel);
    if !path.exists() {
        info!("no {} file at {}; continuing without it", what, path.display());
        return Ok(T::default());
    }
    load(&path)
}

/// Load every snapshot named in the config.
///
/// Players, rosters and the schedule are required; free agents, box scores
/// and matchup history are optional.
pub fn load_snapshot(config: &Config) -> Result<Snapshot, SnapshotError> {
    let paths = &config.data_paths;
    let players = load_players(&config.data_file(&paths.players))?;
    if players.is_empty() {
        return Err(SnapshotError::Validation(
            "player snapshot produced zero valid records".into(),
        ));
    }
    let rosters = load_rosters(&config.data_file(&paths.rosters))?;
    let mut schedule = load_schedule(&config.data_file(&paths.schedule))?;
    fill_from_games(&mut schedule, config);
    if schedule.is_empty() {
        warn!("schedule snapshot has no periods");
    }

    let free_agents = load_optional(config, paths.free_agents.as_ref(), "free-agent", load_free_agents)?;
    let box_scores = load_optional(config, paths.box_scores.as_ref(), "box-score", load_box_scores)?;
    let history = load_optional(
        config,
        paths.matchup_history.as_ref(),
        "matchup history",
        load_matchup_history,
    )?;

    info!(
        "snapshot loaded: {} players, {} fantasy rosters, {} free agents, {} schedule periods, {} box-score rows, {} standings periods",
        players.len(),
        rosters.len(),
        free_agents.len(),
        schedule.period_ids().len(),
        box_scores.len(),
        history.len()
    );

    Ok(Snapshot {
        players,
        rosters,
        free_agents,
        schedule,
        box_scores,
        history,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn player_json_defaults_missing_and_null_fields() {
        let json = r#"[
            {"name": " Ana Lee ", "team": "VCU", "games": 10, "minutes": 300, "fgm": 50, "fga": 100, "pts": null},
            {"name": "Bo Kim", "team": "Dayton", "tov": 12, "ppg": 14.5}
        ]"#;
        let players = load_players_from_json(json.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Ana Lee");
        assert_eq!(players[0].total_minutes, 300.0);
        assert_eq!(players[0].pts, 0);
        assert_eq!(players[0].ppg, None);
        assert_eq!(players[1].games, 0);
        assert_eq!(players[1].to, 12);
        assert_eq!(players[1].ppg, Some(14.5));
    }

    #[test]
    fn player_json_skips_malformed_and_unnamed_records() {
        let json = r#"[
            {"name": "Ana Lee", "team": "VCU", "games": "ten"},
            {"name": "", "team": "VCU"},
            {"name": "Cy Ode", "team": "Fordham", "games": 4}
        ]"#;
        let players = load_players_from_json(json.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Cy Ode");
    }

    #[test]
    fn player_json_must_be_an_array() {
        assert!(load_players_from_json(r#"{"name": "x"}"#.as_bytes()).is_err());
    }

    #[test]
    fn player_csv_with_blank_cells() {
        let csv_data = "\
name,team,games,total_minutes,fgm,fga,tpm,ftm,fta,reb,ast,stl,blk,to,pts,ppg
Ana Lee,VCU,10,300,50,100,10,20,25,60,30,10,5,15,130,
Bo Kim,Dayton,8,,30,70,,10,12,40,20,8,2,10,70,8.8";
        let players = load_players_from_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].pts, 130);
        assert_eq!(players[0].ppg, None);
        assert_eq!(players[1].total_minutes, 0.0);
        assert_eq!(players[1].tpm, 0);
        assert_eq!(players[1].ppg, Some(8.8));
    }

    #[test]
    fn rosters_nested_by_fantasy_team() {
        let json = r#"{
            "Sick-Os Revenge": {"players": [{"name": "Ana Lee ", "team": "VCU"}, {"name": "", "team": "x"}]},
            "Other": {}
        }"#;
        let rosters = load_rosters_from_reader(json.as_bytes()).unwrap();
        assert_eq!(rosters.len(), 2);
        assert_eq!(rosters["Sick-Os Revenge"], vec![RosterEntry::new("Ana Lee", "VCU")]);
        assert!(rosters["Other"].is_empty());
    }

    #[test]
    fn schedule_keys_parse_as_periods() {
        let json = r#"{
            "15": {
                "start": "2026-02-16", "end": "2026-02-22",
                "games_per_team": {"VCU": 2},
                "game_dates_per_team": {"VCU": ["2026-02-17", "2026-02-21"]}
            }
        }"#;
        let schedule: LeagueSchedule = serde_json::from_str(json).unwrap();
        let period = schedule.period(15).unwrap();
        assert_eq!(period.games_for("VCU"), 2);
        assert!(period.plays_on("VCU", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()));
    }
}

// Aggregation of per-game box-score rows into player statistic records.
//
// This is the source of recent-form snapshots: the same rows aggregated
// over each player's last N games instead of the whole season.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::round_to;
use crate::stats::{null_as_default, PlayerSeasonStat};

/// One player's line from one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreRow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_id: String,
    /// ISO date (`YYYY-MM-DD`); sorts chronologically as text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fgm: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fga: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tpm: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tpa: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ftm: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fta: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reb: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ast: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stl: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blk: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pf: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pts: i32,
}

impl BoxScoreRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Grouping key: players are distinct per (name, team, position).
type PlayerKey = (String, String, String);

/// Aggregate box-score rows into one record per player.
///
/// Rows with zero minutes are ignored. With `last_n_games`, only each
/// player's most recent N rows (by date) count. Games are distinct game
/// ids. Per-game rates and minutes per game are rounded to 1 decimal.
/// Output is sorted by points per game, highest first.
pub fn aggregate_box_scores(rows: &[BoxScoreRow], last_n_games: Option<usize>) -> Vec<PlayerSeasonStat> {
    let mut order: Vec<PlayerKey> = Vec::new();
    let mut groups: HashMap<PlayerKey, Vec<&BoxScoreRow>> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        if row.minutes.round() <= 0.0 {
            skipped += 1;
            continue;
        }
        let key = (row.full_name(), row.team.clone(), row.position.clone());
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        group.push(row);
    }

    let mut out: Vec<PlayerSeasonStat> = order
        .into_iter()
        .filter_map(|key| {
            let mut games = groups.remove(&key)?;
            if let Some(n) = last_n_games {
                games.sort_by(|a, b| b.date.cmp(&a.date));
                games.truncate(n);
            }
            Some(sum_group(key, &games))
        })
        .collect();

    out.sort_by(|a, b| {
        b.ppg
            .unwrap_or(0.0)
            .partial_cmp(&a.ppg.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });
    debug!(
        "aggregated {} box-score rows into {} players ({} zero-minute rows skipped)",
        rows.len(),
        out.len(),
        skipped
    );
    out
}

fn sum_group(key: PlayerKey, rows: &[&BoxScoreRow]) -> PlayerSeasonStat {
    let (name, team, position) = key;
    let distinct: HashSet<&str> = rows.iter().map(|r| r.game_id.as_str()).collect();
    let games = distinct.len() as u32;

    let sum = |f: fn(&BoxScoreRow) -> i32| {
        rows.iter().fold(0i32, |acc, r| acc.saturating_add(f(*r)))
    };
    let total_minutes: f64 = rows.iter().map(|r| r.minutes).sum();

    let mut stat = PlayerSeasonStat {
        name,
        team,
        position: (!position.is_empty()).then_some(position),
        games,
        total_minutes,
        fgm: sum(|r| r.fgm),
        fga: sum(|r| r.fga),
        tpm: sum(|r| r.tpm),
        tpa: sum(|r| r.tpa),
        ftm: sum(|r| r.ftm),
        fta: sum(|r| r.fta),
        reb: sum(|r| r.reb),
        ast: sum(|r| r.ast),
        stl: sum(|r| r.stl),
        blk: sum(|r| r.blk),
        to: sum(|r| r.to),
        pts: sum(|r| r.pts),
        ..Default::default()
    };

    let divisor = games.max(1) as f64;
    let per_game = |total: i32| Some(round_to(total as f64 / divisor, 1));
    stat.ppg = per_game(stat.pts);
    stat.rpg = per_game(stat.reb);
    stat.apg = per_game(stat.ast);
    stat.spg = per_game(stat.stl);
    stat.bpg = per_game(stat.blk);
    stat.topg = per_game(stat.to);
    stat.tpm_pg = per_game(stat.tpm);
    stat.mpg = Some(round_to(total_minutes / divisor, 1));
    stat
}

// Raw per-player statistics snapshot records.
//
// Field names follow the statistics snapshot's JSON/CSV keys. Every numeric
// field is optional on the wire: missing or `null` values become zero, and
// the pre-aggregated per-game rates stay `None` so the line builder can fall
// back to `total / games`.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a field that may be absent or `null`, defaulting to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Season (or recent-window) aggregate for one player on one team.
///
/// Shot and box-score totals are signed so that a malformed snapshot with
/// negative values still loads; the data-quality checks report those rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub games: u32,
    /// Total minutes across all games.
    #[serde(default, alias = "minutes", deserialize_with = "null_as_default")]
    pub total_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpg: Option<f64>,

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
    #[serde(default, alias = "tov", deserialize_with = "null_as_default")]
    pub to: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pts: i32,

    // Pre-aggregated per-game rates. `None` means "derive from totals".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm_pg: Option<f64>,
}

impl PlayerSeasonStat {
    /// Games used as a rate divisor: zero games counts as one.
    pub fn rate_divisor(&self) -> f64 {
        self.games.max(1) as f64
    }

    /// Minutes per game, preferring the snapshot's own figure.
    pub fn minutes_per_game(&self) -> f64 {
        self.mpg
            .unwrap_or_else(|| self.total_minutes / self.rate_divisor())
    }
}

/// A roster-system player entry: the name and team label as the fantasy
/// platform spells them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        RosterEntry {
            name: name.into(),
            team: team.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_fields_default_to_zero() {
        let json = r#"{"name": "A Player", "team": "Dayton", "games": 10, "fgm": null}"#;
        let stat: PlayerSeasonStat = serde_json::from_str(json).unwrap();
        assert_eq!(stat.games, 10);
        assert_eq!(stat.fgm, 0);
        assert_eq!(stat.fta, 0);
        assert!(stat.ppg.is_none());
        assert_eq!(stat.total_minutes, 0.0);
    }

    #[test]
    fn minutes_per_game_falls_back_to_totals() {
        let stat = PlayerSeasonStat {
            games: 4,
            total_minutes: 100.0,
            ..Default::default()
        };
        assert_eq!(stat.minutes_per_game(), 25.0);

        let with_mpg = PlayerSeasonStat {
            mpg: Some(31.5),
            ..stat
        };
        assert_eq!(with_mpg.minutes_per_game(), 31.5);
    }

    #[test]
    fn zero_games_divides_by_one() {
        let stat = PlayerSeasonStat {
            total_minutes: 12.0,
            ..Default::default()
        };
        assert_eq!(stat.rate_divisor(), 1.0);
        assert_eq!(stat.minutes_per_game(), 12.0);
    }
}

// Population-relative z-scores across the nine categories.

use serde::Serialize;
use tracing::debug;

use crate::category::{round_to, Category, CategoryMap};
use crate::line::CategoryLine;
use crate::stats::PlayerSeasonStat;

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single category across a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
    /// Number of values the stats were computed from.
    pub count: usize,
}

/// Compute mean and population standard deviation (N denominator).
///
/// An empty slice yields `mean 0, stdev 1`. A variance of exactly zero
/// yields `stdev 1` so every z-score in that category is `value - mean`.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 1.0,
            count: 0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stdev = if variance > 0.0 { variance.sqrt() } else { 1.0 };
    PoolStats {
        mean,
        stdev,
        count: values.len(),
    }
}

/// Raw z-score of `value` against `stats`. Callers handle inversion.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    (value - stats.mean) / stats.stdev
}

// ---------------------------------------------------------------------------
// Population filters
// ---------------------------------------------------------------------------

/// Minimum playing time for a player to enter the reference population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolFilter {
    pub min_games: u32,
    pub min_mpg: f64,
}

impl PoolFilter {
    pub fn new(min_games: u32, min_mpg: f64) -> Self {
        PoolFilter { min_games, min_mpg }
    }

    pub fn admits(&self, stat: &PlayerSeasonStat) -> bool {
        stat.games >= self.min_games && stat.minutes_per_game() >= self.min_mpg
    }
}

impl Default for PoolFilter {
    fn default() -> Self {
        PoolFilter {
            min_games: 5,
            min_mpg: 10.0,
        }
    }
}

/// Per-game attempt minimums below which a percentage is not scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeGates {
    pub min_fga_pg: f64,
    pub min_fta_pg: f64,
}

impl VolumeGates {
    /// The line's value for `cat` if it passes that category's gate.
    pub fn gated_value(&self, line: &CategoryLine, cat: Category) -> Option<f64> {
        let passes = match cat {
            Category::AdjFgPct => line.fga_pg >= self.min_fga_pg,
            Category::FtPct => line.fta_pg >= self.min_fta_pg,
            _ => true,
        };
        if passes {
            line.value(cat)
        } else {
            None
        }
    }
}

impl Default for VolumeGates {
    fn default() -> Self {
        VolumeGates {
            min_fga_pg: 2.0,
            min_fta_pg: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scored rows
// ---------------------------------------------------------------------------

/// A player's z-scores within one population.
#[derive(Debug, Clone, Serialize)]
pub struct ZScoreRow {
    pub name: String,
    pub team: String,
    pub games: u32,
    pub mpg: f64,
    pub line: CategoryLine,
    /// `None` when the player has no value or fails the volume gate.
    pub z: CategoryMap<Option<f64>>,
}

impl ZScoreRow {
    pub fn z(&self, cat: Category) -> Option<f64> {
        self.z[cat]
    }
}

/// Per-category pool stats over a set of lines, honoring the volume gates.
pub fn category_pools(lines: &[CategoryLine], gates: &VolumeGates) -> CategoryMap<PoolStats> {
    CategoryMap::from_fn(|cat| {
        let values: Vec<f64> = lines
            .iter()
            .filter_map(|line| gates.gated_value(line, cat))
            .collect();
        compute_pool_stats(&values)
    })
}

/// Score every category for one line against precomputed pools.
///
/// Turnovers are negated so fewer turnovers scores higher. Scores are
/// rounded to two decimals.
pub fn score_line(
    line: &CategoryLine,
    pools: &CategoryMap<PoolStats>,
    gates: &VolumeGates,
) -> CategoryMap<Option<f64>> {
    CategoryMap::from_fn(|cat| {
        gates.gated_value(line, cat).map(|value| {
            let z = compute_zscore(value, &pools[cat]);
            let z = if cat.is_inverse() { -z } else { z };
            round_to(z, 2)
        })
    })
}

/// Compute z-scores for every player passing `filter`, in input order.
///
/// The qualifying population is both the reference group and the output.
/// An empty population yields an empty vector.
pub fn compute_z_scores(
    players: &[PlayerSeasonStat],
    filter: &PoolFilter,
    gates: &VolumeGates,
) -> Vec<ZScoreRow> {
    let qualified: Vec<&PlayerSeasonStat> = players.iter().filter(|p| filter.admits(p)).collect();
    if qualified.is_empty() {
        debug!(
            "no players qualify (min_games={}, min_mpg={})",
            filter.min_games, filter.min_mpg
        );
        return Vec::new();
    }

    let lines: Vec<CategoryLine> = qualified.iter().map(|p| CategoryLine::from_stat(p)).collect();
    let pools = category_pools(&lines, gates);
    debug!(
        "scoring {} of {} players; AdjFG% pool {}, FT% pool {}",
        lines.len(),
        players.len(),
        pools[Category::AdjFgPct].count,
        pools[Category::FtPct].count
    );

    lines
        .into_iter()
        .map(|line| {
            let z = score_line(&line, &pools, gates);
            ZScoreRow {
                name: line.name.clone(),
                team: line.team.clone(),
                games: line.games,
                mpg: line.mpg,
                line,
                z,
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

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Deterministic linear congruential generator for synthetic populations.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        fn range(&mut self, lo: i32, hi: i32) -> i32 {
            lo + (self.next_f64() * (hi - lo + 1) as f64) as i32
        }
    }

    fn synthetic_population(seed: u64, n: usize) -> Vec<PlayerSeasonStat> {
        let mut rng = Lcg(seed);
        (0..n)
            .map(|i| {
                let games = rng.range(3, 30) as u32;
                let g = games as i32;
                let fga = rng.range(0, 15) * g;
                let fgm = (fga as f64 * (0.3 + 0.3 * rng.next_f64())) as i32;
                let tpm = rng.range(0, fgm.min(3 * g).max(0));
                let fta = rng.range(0, 6) * g;
                let ftm = (fta as f64 * (0.5 + 0.4 * rng.next_f64())) as i32;
                PlayerSeasonStat {
                    name: format!("Player {i}"),
                    team: format!("Team {}", i % 14),
                    games,
                    total_minutes: games as f64 * (4.0 + 32.0 * rng.next_f64()),
                    fgm,
                    fga,
                    tpm,
                    ftm,
                    fta,
                    reb: rng.range(0, 10) * g,
                    ast: rng.range(0, 6) * g,
                    stl: rng.range(0, 3) * g,
                    blk: rng.range(0, 2) * g,
                    to: rng.range(0, 4) * g,
                    pts: 2 * (fgm - tpm) + 3 * tpm + ftm,
                    ..Default::default()
                }
            })
            .collect()
    }

    fn simple(name: &str, games: u32, to: i32) -> PlayerSeasonStat {
        PlayerSeasonStat {
            name: name.into(),
            team: "Dayton".into(),
            games,
            total_minutes: games as f64 * 25.0,
            fgm: 5 * games as i32,
            fga: 10 * games as i32,
            tpm: games as i32,
            ftm: 2 * games as i32,
            fta: 3 * games as i32,
            pts: 13 * games as i32,
            reb: 4 * games as i32,
            to,
            ..Default::default()
        }
    }

    // ---- compute_pool_stats ----

    #[test]
    fn pool_stats_population_variance() {
        // mean 5, population variance 4, stdev 2
        let stats = compute_pool_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx_eq(stats.mean, 5.0, 1e-12));
        assert!(approx_eq(stats.stdev, 2.0, 1e-12));
        assert_eq!(stats.count, 8);
    }

    #[test]
    fn pool_stats_empty_and_zero_variance() {
        let empty = compute_pool_stats(&[]);
        assert_eq!(empty.mean, 0.0);
        assert_eq!(empty.stdev, 1.0);

        let flat = compute_pool_stats(&[3.0, 3.0, 3.0]);
        assert_eq!(flat.mean, 3.0);
        assert_eq!(flat.stdev, 1.0);
        assert_eq!(compute_zscore(4.5, &flat), 1.5);
    }

    // ---- filters ----

    #[test]
    fn pool_filter_requires_games_and_minutes() {
        let filter = PoolFilter::default();
        assert!(filter.admits(&simple("ok", 5, 0)));
        assert!(!filter.admits(&simple("few games", 4, 0)));
        let low_minutes = PlayerSeasonStat {
            total_minutes: 45.0,
            ..simple("low minutes", 5, 0)
        };
        assert!(!filter.admits(&low_minutes));
    }

    #[test]
    fn volume_gates_null_low_attempt_percentages() {
        let stat = PlayerSeasonStat {
            games: 10,
            fgm: 10,
            fga: 15,
            ftm: 5,
            fta: 9,
            ..Default::default()
        };
        let line = CategoryLine::from_stat(&stat);
        let gates = VolumeGates::default();
        assert_eq!(gates.gated_value(&line, Category::AdjFgPct), None);
        assert_eq!(gates.gated_value(&line, Category::FtPct), None);
        assert_eq!(gates.gated_value(&line, Category::Points), Some(0.0));
    }

    // ---- compute_z_scores ----

    #[test]
    fn empty_population_yields_empty_result() {
        let rows = compute_z_scores(&[], &PoolFilter::default(), &VolumeGates::default());
        assert!(rows.is_empty());

        let benchwarmers = vec![simple("a", 1, 0), simple("b", 2, 0)];
        let rows = compute_z_scores(&benchwarmers, &PoolFilter::default(), &VolumeGates::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn fewer_turnovers_scores_higher() {
        let players = vec![
            simple("careful", 10, 10),
            simple("sloppy", 10, 40),
            simple("middle", 10, 25),
        ];
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        let careful = rows[0].z(Category::Turnovers).unwrap();
        let sloppy = rows[1].z(Category::Turnovers).unwrap();
        assert!(careful > sloppy);
        assert!(careful > 0.0);
    }

    #[test]
    fn identical_players_score_zero() {
        let players = vec![simple("a", 10, 20), simple("b", 10, 20)];
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        for row in &rows {
            for (_, z) in row.z.iter() {
                assert_eq!(*z, Some(0.0));
            }
        }
    }

    #[test]
    fn gated_player_gets_null_and_is_excluded_from_pool() {
        let mut players = vec![simple("a", 10, 20), simple("b", 10, 20)];
        players[1].fga = 10; // 1 FGA per game
        players[1].fgm = 9;
        players[1].tpm = 0;
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        assert_eq!(rows[1].z(Category::AdjFgPct), None);
        // Player a alone forms the AdjFG% pool.
        assert_eq!(rows[0].z(Category::AdjFgPct), Some(0.0));
    }

    #[test]
    fn zscores_are_mean_centered() {
        for seed in [1u64, 7, 42, 2024, 99991] {
            let players = synthetic_population(seed, 120);
            let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
            assert!(!rows.is_empty());
            for cat in Category::ALL {
                let values: Vec<f64> = rows.iter().filter_map(|r| r.z(cat)).collect();
                if values.is_empty() {
                    continue;
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                assert!(mean.abs() < 0.1, "seed {seed} {cat}: mean {mean}");
            }
        }
    }

    #[test]
    fn zscores_are_rounded_to_two_places() {
        let players = synthetic_population(5, 60);
        let rows = compute_z_scores(&players, &PoolFilter::default(), &VolumeGates::default());
        for row in &rows {
            for (_, z) in row.z.iter() {
                if let Some(z) = z {
                    assert!(approx_eq(*z, round_to(*z, 2), 1e-12));
                }
            }
        }
    }
}

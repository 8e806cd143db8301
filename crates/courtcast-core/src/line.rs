// Per-game category lines derived from raw stat snapshots.

use serde::Serialize;

use crate::category::Category;
use crate::stats::PlayerSeasonStat;

/// Adjusted FG%: `(FGM + 0.5 * 3PM) / FGA`, or `None` with no attempts.
pub fn calc_adj_fg_pct(fgm: f64, tpm: f64, fga: f64) -> Option<f64> {
    if fga == 0.0 {
        return None;
    }
    Some((fgm + 0.5 * tpm) / fga)
}

/// FT%: `FTM / FTA`, or `None` with no attempts.
pub fn calc_ft_pct(ftm: f64, fta: f64) -> Option<f64> {
    if fta == 0.0 {
        return None;
    }
    Some(ftm / fta)
}

/// Per-game category line for a player, plus the shot volume needed to
/// aggregate percentages across a roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLine {
    pub name: String,
    pub team: String,
    /// Games as reported; never floored.
    pub games: u32,
    pub mpg: f64,

    // Per-game counting rates
    pub tpm_pg: f64,
    pub pts_pg: f64,
    pub reb_pg: f64,
    pub ast_pg: f64,
    pub stl_pg: f64,
    pub blk_pg: f64,
    pub to_pg: f64,

    // Season-level percentages (not per-game averages)
    pub adj_fg_pct: Option<f64>,
    pub ft_pct: Option<f64>,

    // Raw shot totals
    pub fgm: i32,
    pub fga: i32,
    pub tpm: i32,
    pub ftm: i32,
    pub fta: i32,

    // Per-game shot volume
    pub fgm_pg: f64,
    pub fga_pg: f64,
    pub ftm_pg: f64,
    pub fta_pg: f64,
    /// Unrounded made threes per game, used for the adjusted-FG numerator.
    pub tpm_raw_pg: f64,
}

impl CategoryLine {
    /// Build a line from a raw snapshot record.
    ///
    /// Rates come from the snapshot's pre-aggregated per-game fields when
    /// present and from `total / games` otherwise. Zero games divides by one.
    pub fn from_stat(stat: &PlayerSeasonStat) -> Self {
        let divisor = stat.rate_divisor();
        let rate = |given: Option<f64>, total: i32| given.unwrap_or(total as f64 / divisor);

        let fgm = stat.fgm as f64;
        let fga = stat.fga as f64;
        let tpm = stat.tpm as f64;
        let ftm = stat.ftm as f64;
        let fta = stat.fta as f64;

        CategoryLine {
            name: stat.name.clone(),
            team: stat.team.clone(),
            games: stat.games,
            mpg: stat.minutes_per_game(),
            tpm_pg: rate(stat.tpm_pg, stat.tpm),
            pts_pg: rate(stat.ppg, stat.pts),
            reb_pg: rate(stat.rpg, stat.reb),
            ast_pg: rate(stat.apg, stat.ast),
            stl_pg: rate(stat.spg, stat.stl),
            blk_pg: rate(stat.bpg, stat.blk),
            to_pg: rate(stat.topg, stat.to),
            adj_fg_pct: calc_adj_fg_pct(fgm, tpm, fga),
            ft_pct: calc_ft_pct(ftm, fta),
            fgm: stat.fgm,
            fga: stat.fga,
            tpm: stat.tpm,
            ftm: stat.ftm,
            fta: stat.fta,
            fgm_pg: fgm / divisor,
            fga_pg: fga / divisor,
            ftm_pg: ftm / divisor,
            fta_pg: fta / divisor,
            tpm_raw_pg: tpm / divisor,
        }
    }

    /// The value this line contributes to a category's population, if any.
    pub fn value(&self, cat: Category) -> Option<f64> {
        match cat {
            Category::AdjFgPct => self.adj_fg_pct,
            Category::ThreesMade => Some(self.tpm_pg),
            Category::FtPct => self.ft_pct,
            Category::Points => Some(self.pts_pg),
            Category::Rebounds => Some(self.reb_pg),
            Category::Assists => Some(self.ast_pg),
            Category::Steals => Some(self.stl_pg),
            Category::Blocks => Some(self.blk_pg),
            Category::Turnovers => Some(self.to_pg),
        }
    }
}

impl From<&PlayerSeasonStat> for CategoryLine {
    fn from(stat: &PlayerSeasonStat) -> Self {
        CategoryLine::from_stat(stat)
    }
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

    #[test]
    fn adj_fg_pct_without_attempts_is_none() {
        for (makes, threes) in [(0.0, 0.0), (5.0, 2.0), (100.0, 40.0)] {
            assert_eq!(calc_adj_fg_pct(makes, threes, 0.0), None);
        }
    }

    #[test]
    fn adj_fg_pct_credits_half_a_make_per_three() {
        // (6 + 0.5 * 2) / 10 = 0.7
        let pct = calc_adj_fg_pct(6.0, 2.0, 10.0).unwrap();
        assert!(approx_eq(pct, 0.7, 1e-12));
    }

    #[test]
    fn ft_pct_without_attempts_is_none() {
        assert_eq!(calc_ft_pct(0.0, 0.0), None);
        assert!(approx_eq(calc_ft_pct(3.0, 4.0).unwrap(), 0.75, 1e-12));
    }

    #[test]
    fn line_prefers_snapshot_rates() {
        let stat = PlayerSeasonStat {
            name: "Rate Player".into(),
            team: "VCU".into(),
            games: 10,
            pts: 153,
            ppg: Some(15.3),
            reb: 52,
            ..Default::default()
        };
        let line = CategoryLine::from_stat(&stat);
        assert!(approx_eq(line.pts_pg, 15.3, 1e-12));
        // No rpg on the record: derived from totals.
        assert!(approx_eq(line.reb_pg, 5.2, 1e-12));
    }

    #[test]
    fn zero_games_keeps_displayed_count() {
        let stat = PlayerSeasonStat {
            name: "No Games".into(),
            team: "Fordham".into(),
            games: 0,
            fgm: 3,
            fga: 6,
            ..Default::default()
        };
        let line = CategoryLine::from_stat(&stat);
        assert_eq!(line.games, 0);
        assert!(approx_eq(line.fga_pg, 6.0, 1e-12));
        assert!(approx_eq(line.adj_fg_pct.unwrap(), 0.5, 1e-12));
        assert_eq!(line.ft_pct, None);
    }

    #[test]
    fn value_maps_every_category() {
        let stat = PlayerSeasonStat {
            games: 2,
            tpm: 4,
            pts: 40,
            reb: 10,
            ast: 6,
            stl: 2,
            blk: 1,
            to: 3,
            fgm: 14,
            fga: 28,
            ftm: 8,
            fta: 10,
            ..Default::default()
        };
        let line = CategoryLine::from_stat(&stat);
        assert!(approx_eq(line.value(Category::AdjFgPct).unwrap(), 16.0 / 28.0, 1e-12));
        assert_eq!(line.value(Category::ThreesMade), Some(2.0));
        assert_eq!(line.value(Category::FtPct), Some(0.8));
        assert_eq!(line.value(Category::Points), Some(20.0));
        assert_eq!(line.value(Category::Rebounds), Some(5.0));
        assert_eq!(line.value(Category::Assists), Some(3.0));
        assert_eq!(line.value(Category::Steals), Some(1.0));
        assert_eq!(line.value(Category::Blocks), Some(0.5));
        assert_eq!(line.value(Category::Turnovers), Some(1.5));
    }
}

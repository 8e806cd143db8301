// Composite scores: weighted sums of per-category z-scores, optionally
// scaled by how many games a player's team plays in a period.

use serde::Serialize;

use crate::category::{round_to, Category, CategoryMap};

/// Default game count a schedule multiplier is measured against.
pub const DEFAULT_BASELINE_GAMES: f64 = 2.0;

/// Per-category multipliers. A weight of 0 punts the category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryWeights(pub CategoryMap<f64>);

impl CategoryWeights {
    /// Every category weighted 1.0.
    pub fn uniform() -> Self {
        CategoryWeights(CategoryMap::from_fn(|_| 1.0))
    }

    pub fn weight(&self, cat: Category) -> f64 {
        self.0[cat]
    }

    pub fn set(&mut self, cat: Category, weight: f64) {
        self.0[cat] = weight;
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights::uniform()
    }
}

/// Weighted sum of z-scores. `None` contributes nothing. Rounded to 2 places.
pub fn composite_z_score(z: &CategoryMap<Option<f64>>, weights: &CategoryWeights) -> f64 {
    let total: f64 = z
        .iter()
        .filter_map(|(cat, value)| value.map(|v| v * weights.weight(cat)))
        .sum();
    round_to(total, 2)
}

/// Multiplier applied to counting categories: `team_games / baseline`,
/// or 1.0 when the baseline is not positive.
pub fn schedule_multiplier(team_games: u32, baseline_games: f64) -> f64 {
    if baseline_games > 0.0 {
        team_games as f64 / baseline_games
    } else {
        1.0
    }
}

/// Composite with counting-category z-scores scaled by the team's game
/// count. Percentages and turnovers are left unscaled.
pub fn schedule_adjusted_composite(
    z: &CategoryMap<Option<f64>>,
    team_games: u32,
    baseline_games: f64,
    weights: &CategoryWeights,
) -> f64 {
    let multiplier = schedule_multiplier(team_games, baseline_games);
    let total: f64 = z
        .iter()
        .filter_map(|(cat, value)| {
            let scale = if cat.is_counting() { multiplier } else { 1.0 };
            value.map(|v| v * weights.weight(cat) * scale)
        })
        .sum();
    round_to(total, 2)
}

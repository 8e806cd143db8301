// Head-to-head category comparison between two team projections.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::category::{round_to, Category};
use crate::projection::TeamProjection;

/// Which side takes a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TeamA,
    TeamB,
    Tie,
}

impl Outcome {
    /// Short code used in reports: `A`, `B` or `T`.
    pub fn code(self) -> &'static str {
        match self {
            Outcome::TeamA => "A",
            Outcome::TeamB => "B",
            Outcome::Tie => "T",
        }
    }

    /// Outcome of `a` against `b` in `cat`. Exact equality ties.
    pub fn decide(cat: Category, a: f64, b: f64) -> Self {
        if cat.beats(a, b) {
            Outcome::TeamA
        } else if cat.beats(b, a) {
            Outcome::TeamB
        } else {
            Outcome::Tie
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One category's comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    pub category: Category,
    pub team_a_value: f64,
    pub team_b_value: f64,
    pub winner: Outcome,
    /// Absolute difference, rounded to 4 decimals.
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupResult {
    pub team_a: String,
    pub team_b: String,
    pub comparisons: Vec<CategoryComparison>,
    pub wins_a: u32,
    pub wins_b: u32,
    pub ties: u32,
}

impl MatchupResult {
    /// Record from team A's side, `W-L-T`.
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins_a, self.wins_b, self.ties)
    }

    pub fn comparison(&self, cat: Category) -> Option<&CategoryComparison> {
        self.comparisons.iter().find(|c| c.category == cat)
    }
}

impl fmt::Display for MatchupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}: {}", self.team_a, self.team_b, self.record())
    }
}

/// Compare two projections category by category, in league order.
pub fn compare_categories(a: &TeamProjection, b: &TeamProjection) -> MatchupResult {
    let mut result = MatchupResult {
        team_a: a.team_name.clone(),
        team_b: b.team_name.clone(),
        comparisons: Vec::with_capacity(Category::COUNT),
        wins_a: 0,
        wins_b: 0,
        ties: 0,
    };

    for cat in Category::ALL {
        let a_val = a.total(cat);
        let b_val = b.total(cat);
        let winner = Outcome::decide(cat, a_val, b_val);
        match winner {
            Outcome::TeamA => result.wins_a += 1,
            Outcome::TeamB => result.wins_b += 1,
            Outcome::Tie => result.ties += 1,
        }
        result.comparisons.push(CategoryComparison {
            category: cat,
            team_a_value: a_val,
            team_b_value: b_val,
            winner,
            margin: round_to((a_val - b_val).abs(), 4),
        });
    }

    result
}

/// `compare_categories` with comparisons sorted by margin, largest first.
/// Equal margins keep league order.
pub fn predict_matchup(a: &TeamProjection, b: &TeamProjection) -> MatchupResult {
    let mut result = compare_categories(a, b);
    result.comparisons.sort_by(|x, y| {
        y.margin
            .partial_cmp(&x.margin)
            .unwrap_or(Ordering::Equal)
    });
    result
}

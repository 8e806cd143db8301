// The nine head-to-head scoring categories and a fixed-size map keyed by them.
//
// Order and polarity live here and nowhere else: every component iterates
// `Category::ALL` and asks the category whether lower is better.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// One of the nine fixed head-to-head categories, in league display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Adjusted field-goal percentage: (FGM + 0.5 * 3PM) / FGA.
    AdjFgPct,
    ThreesMade,
    FtPct,
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category label `{0}`")]
pub struct CategoryParseError(pub String);

impl Category {
    /// All categories in league order.
    pub const ALL: [Category; 9] = [
        Category::AdjFgPct,
        Category::ThreesMade,
        Category::FtPct,
        Category::Points,
        Category::Rebounds,
        Category::Assists,
        Category::Steals,
        Category::Blocks,
        Category::Turnovers,
    ];

    pub const COUNT: usize = 9;

    /// Position of this category in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// League label, e.g. `AdjFG%` or `3PTM`.
    pub fn label(self) -> &'static str {
        match self {
            Category::AdjFgPct => "AdjFG%",
            Category::ThreesMade => "3PTM",
            Category::FtPct => "FT%",
            Category::Points => "PTS",
            Category::Rebounds => "REB",
            Category::Assists => "AST",
            Category::Steals => "ST",
            Category::Blocks => "BLK",
            Category::Turnovers => "TO",
        }
    }

    /// Lower is better. Only turnovers.
    pub fn is_inverse(self) -> bool {
        matches!(self, Category::Turnovers)
    }

    /// Rate categories that are aggregated from makes and attempts.
    pub fn is_percentage(self) -> bool {
        matches!(self, Category::AdjFgPct | Category::FtPct)
    }

    /// Categories whose totals grow with games played. Turnovers accumulate
    /// too, but they are excluded because more of them is worse.
    pub fn is_counting(self) -> bool {
        !self.is_percentage() && !self.is_inverse()
    }

    /// True when `a` beats `b` in this category.
    pub fn beats(self, a: f64, b: f64) -> bool {
        if self.is_inverse() {
            a < b
        } else {
            a > b
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CategoryParseError(trimmed.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CategoryMap
// ---------------------------------------------------------------------------

/// A value for every category, stored in league order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMap<T> {
    values: [T; Category::COUNT],
}

impl<T> CategoryMap<T> {
    /// Build a map by evaluating `f` once per category, in league order.
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        CategoryMap {
            values: Category::ALL.map(&mut f),
        }
    }

    pub fn get(&self, cat: Category) -> &T {
        &self.values[cat.index()]
    }

    /// Iterate `(category, value)` pairs in league order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> CategoryMap<U> {
        CategoryMap::from_fn(|cat| f(cat, &self.values[cat.index()]))
    }
}

impl<T: Default> Default for CategoryMap<T> {
    fn default() -> Self {
        CategoryMap::from_fn(|_| T::default())
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, cat: Category) -> &T {
        &self.values[cat.index()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, cat: Category) -> &mut T {
        &mut self.values[cat.index()]
    }
}

impl<T: Serialize> Serialize for CategoryMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::COUNT))?;
        for (cat, value) in self.iter() {
            map.serialize_entry(cat.label(), value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Rounding helpers shared by the scoring modules
// ---------------------------------------------------------------------------

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_league_display() {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["AdjFG%", "3PTM", "FT%", "PTS", "REB", "AST", "ST", "BLK", "TO"]
        );
        for (i, cat) in Category::ALL.iter().enumerate() {
            assert_eq!(cat.index(), i);
        }
    }

    #[test]
    fn turnovers_is_the_only_inverse_category() {
        let inverse: Vec<Category> = Category::ALL.into_iter().filter(|c| c.is_inverse()).collect();
        assert_eq!(inverse, vec![Category::Turnovers]);
    }

    #[test]
    fn counting_excludes_percentages_and_turnovers() {
        let counting: Vec<Category> = Category::ALL.into_iter().filter(|c| c.is_counting()).collect();
        assert_eq!(
            counting,
            vec![
                Category::ThreesMade,
                Category::Points,
                Category::Rebounds,
                Category::Assists,
                Category::Steals,
                Category::Blocks,
            ]
        );
    }

    #[test]
    fn beats_respects_polarity() {
        assert!(Category::Points.beats(80.0, 70.0));
        assert!(!Category::Points.beats(70.0, 80.0));
        assert!(Category::Turnovers.beats(10.0, 12.0));
        assert!(!Category::Turnovers.beats(12.0, 10.0));
        assert!(!Category::Rebounds.beats(5.0, 5.0));
    }

    #[test]
    fn parse_labels_case_insensitively() {
        assert_eq!("adjfg%".parse::<Category>(), Ok(Category::AdjFgPct));
        assert_eq!(" ST ".parse::<Category>(), Ok(Category::Steals));
        assert_eq!(
            "STL".parse::<Category>(),
            Err(CategoryParseError("STL".into()))
        );
    }

    #[test]
    fn category_map_serializes_by_label_in_order() {
        let map = CategoryMap::from_fn(|c| c.index() as u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"AdjFG%":0,"3PTM":1,"FT%":2,"PTS":3,"REB":4,"AST":5,"ST":6,"BLK":7,"TO":8}"#
        );
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.53749, 4), 0.5375);
        assert_eq!(round_to(-1.06, 1), -1.1);
    }
}

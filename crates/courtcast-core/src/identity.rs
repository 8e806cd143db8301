// Identity resolution between the roster system's player names and the
// statistics system's canonical records.
//
// The roster platform and the statistics feed spell names and teams
// independently. Resolution runs an ordered list of strategies, first hit
// wins: manual override, normalized exact name, last name + team.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::line::CategoryLine;
use crate::stats::{PlayerSeasonStat, RosterEntry};

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Generational suffixes stripped from the end of a name.
const NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv"];

/// Normalize a player name for matching.
///
/// Lowercases, strips one trailing generational suffix (with an optional
/// comma before it), removes apostrophes and periods, turns hyphens into
/// spaces, and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = strip_suffix(&lowered);
    let cleaned: String = stripped
        .chars()
        .filter(|c| *c != '\'' && *c != '.')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a trailing suffix token. The suffix must be separated from the
/// rest of the name by whitespace, optionally preceded by a comma.
fn strip_suffix(name: &str) -> &str {
    let Some(split) = name.rfind(char::is_whitespace) else {
        return name;
    };
    let token = &name[split..].trim_start();
    if !NAME_SUFFIXES.contains(token) {
        return name;
    }
    let head = name[..split].trim_end();
    head.strip_suffix(',').unwrap_or(head)
}

/// Last whitespace-separated token, lowercased.
fn last_name_token(name: &str) -> Option<String> {
    name.split_whitespace().last().map(str::to_lowercase)
}

// ---------------------------------------------------------------------------
// Team-name canonicalization
// ---------------------------------------------------------------------------

/// Roster-system full team names paired with their statistics-system label.
const DEFAULT_FULL_NAMES: &[(&str, &str)] = &[
    ("Davidson Wildcats", "Davidson"),
    ("Dayton Flyers", "Dayton"),
    ("Duquesne Dukes", "Duquesne"),
    ("Fordham Rams", "Fordham"),
    ("George Mason Patriots", "George Mason"),
    ("George Washington Revolutionaries", "George Washington"),
    ("La Salle Explorers", "La Salle"),
    ("Loyola (IL) Ramblers", "Loyola Chicago"),
    ("Rhode Island Rams", "Rhode Island"),
    ("Richmond Spiders", "Richmond"),
    ("St. Bonaventure Bonnies", "St. Bonaventure"),
    ("Saint Joseph's Hawks", "Saint Joseph's"),
    ("Saint Louis Billikens", "Saint Louis"),
    ("VCU Rams", "VCU"),
];

/// Roster-system short codes paired with their statistics-system label.
const DEFAULT_SHORT_CODES: &[(&str, &str)] = &[
    ("David", "Davidson"),
    ("Dayt", "Dayton"),
    ("Duques", "Duquesne"),
    ("Ford", "Fordham"),
    ("GMas", "George Mason"),
    ("GrgWas", "George Washington"),
    ("LaSal", "La Salle"),
    ("LoyIL", "Loyola Chicago"),
    ("URI", "Rhode Island"),
    ("Rich", "Richmond"),
    ("StBon", "St. Bonaventure"),
    ("StJos", "Saint Joseph's"),
    ("StLou", "Saint Louis"),
    ("VCU", "VCU"),
];

/// Maps roster-system team labels (full names and short codes) to the
/// statistics system's canonical team label.
#[derive(Debug, Clone)]
pub struct TeamNameMap {
    aliases: HashMap<String, String>,
}

impl TeamNameMap {
    /// An empty map: every label passes through unchanged.
    pub fn empty() -> Self {
        TeamNameMap {
            aliases: HashMap::new(),
        }
    }

    /// Register `alias` as another spelling of `canonical`.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Canonical label for a roster-system team label. Unknown labels pass
    /// through unchanged.
    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        self.aliases.get(label).map(String::as_str).unwrap_or(label)
    }

    /// Every roster-system spelling registered for a canonical label.
    pub fn aliases_for(&self, canonical: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, c)| c.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
            .collect();
        found.sort_unstable();
        found
    }

    /// The set of canonical labels this map knows about.
    pub fn canonical_teams(&self) -> BTreeSet<&str> {
        self.aliases.values().map(String::as_str).collect()
    }
}

impl Default for TeamNameMap {
    fn default() -> Self {
        let mut map = TeamNameMap::empty();
        for (alias, canonical) in DEFAULT_FULL_NAMES.iter().chain(DEFAULT_SHORT_CODES) {
            map.insert(*alias, *canonical);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Manual overrides
// ---------------------------------------------------------------------------

/// A known roster-system misspelling and the statistics-system record it
/// should resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOverride {
    /// Statistics-system spelling of the player's name.
    pub name: String,
    /// Statistics-system team to prefer among same-named candidates. When
    /// absent the roster entry's canonical team is used.
    pub team: Option<String>,
}

/// Override table keyed by the lowercased, trimmed roster-system name.
#[derive(Debug, Clone)]
pub struct ManualOverrides {
    entries: HashMap<String, ManualOverride>,
}

impl ManualOverrides {
    pub fn empty() -> Self {
        ManualOverrides {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, roster_name: &str, entry: ManualOverride) {
        self.entries.insert(override_key(roster_name), entry);
    }

    pub fn get(&self, roster_name: &str) -> Option<&ManualOverride> {
        self.entries.get(&override_key(roster_name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ManualOverrides {
    fn default() -> Self {
        let mut overrides = ManualOverrides::empty();
        for (roster_name, stats_name) in [
            ("dejour reaves", "DeJour Reaves"),
            ("deuce jones ii", "Deuce Jones II"),
        ] {
            overrides.insert(
                roster_name,
                ManualOverride {
                    name: stats_name.into(),
                    team: None,
                },
            );
        }
        overrides
    }
}

fn override_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Canonical index
// ---------------------------------------------------------------------------

/// Normalized name -> indices into the statistics population. Several
/// players may share a normalized name; they are told apart by team.
#[derive(Debug, Clone, Default)]
pub struct PlayerIndex {
    by_name: HashMap<String, Vec<usize>>,
}

impl PlayerIndex {
    pub fn build(players: &[PlayerSeasonStat]) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, p) in players.iter().enumerate() {
            by_name.entry(normalize_name(&p.name)).or_default().push(i);
        }
        PlayerIndex { by_name }
    }

    /// Candidate indices for an already-normalized name.
    pub fn candidates(&self, normalized: &str) -> &[usize] {
        self.by_name
            .get(normalized)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One step of the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchStrategy {
    ManualOverride,
    ExactName,
    LastNameAndTeam,
}

impl MatchStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            MatchStrategy::ManualOverride => "override",
            MatchStrategy::ExactName => "exact",
            MatchStrategy::LastNameAndTeam => "last-name",
        }
    }
}

/// Strategies in precedence order.
pub const RESOLUTION_ORDER: [MatchStrategy; 3] = [
    MatchStrategy::ManualOverride,
    MatchStrategy::ExactName,
    MatchStrategy::LastNameAndTeam,
];

/// Outcome of resolving one roster entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Matched {
        player: &'a PlayerSeasonStat,
        index: usize,
        strategy: MatchStrategy,
    },
    Unmatched,
}

impl<'a> Resolution<'a> {
    pub fn player(&self) -> Option<&'a PlayerSeasonStat> {
        match self {
            Resolution::Matched { player, .. } => Some(player),
            Resolution::Unmatched => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

/// Resolves roster-system names against one statistics population.
///
/// Owns its name index; borrows the population and lookup tables from the
/// caller so nothing is cached process-wide.
pub struct Resolver<'a> {
    players: &'a [PlayerSeasonStat],
    index: PlayerIndex,
    teams: &'a TeamNameMap,
    overrides: &'a ManualOverrides,
}

impl<'a> Resolver<'a> {
    pub fn new(
        players: &'a [PlayerSeasonStat],
        teams: &'a TeamNameMap,
        overrides: &'a ManualOverrides,
    ) -> Self {
        Resolver {
            players,
            index: PlayerIndex::build(players),
            teams,
            overrides,
        }
    }

    pub fn players(&self) -> &'a [PlayerSeasonStat] {
        self.players
    }

    pub fn teams(&self) -> &'a TeamNameMap {
        self.teams
    }

    /// Resolve a roster-system name and team label to a canonical record.
    pub fn resolve(&self, roster_name: &str, roster_team: &str) -> Resolution<'a> {
        let team = self.teams.canonical(roster_team);
        for strategy in RESOLUTION_ORDER {
            let hit = match strategy {
                MatchStrategy::ManualOverride => self.by_override(roster_name, team),
                MatchStrategy::ExactName => self.by_normalized_name(roster_name, team),
                MatchStrategy::LastNameAndTeam => self.by_last_name(roster_name, team),
            };
            if let Some(index) = hit {
                return Resolution::Matched {
                    player: &self.players[index],
                    index,
                    strategy,
                };
            }
        }
        debug!("no statistics record for '{}' ({})", roster_name, roster_team);
        Resolution::Unmatched
    }

    pub fn resolve_entry(&self, entry: &RosterEntry) -> Resolution<'a> {
        self.resolve(&entry.name, &entry.team)
    }

    fn by_override(&self, roster_name: &str, team: &str) -> Option<usize> {
        let entry = self.overrides.get(roster_name)?;
        let preferred = entry.team.as_deref().unwrap_or(team);
        let candidates = self.index.candidates(&normalize_name(&entry.name));
        self.pick_by_team(candidates, preferred)
    }

    fn by_normalized_name(&self, roster_name: &str, team: &str) -> Option<usize> {
        let candidates = self.index.candidates(&normalize_name(roster_name));
        match candidates {
            [] => None,
            [only] => Some(*only),
            _ => self.pick_by_team(candidates, team),
        }
    }

    fn by_last_name(&self, roster_name: &str, team: &str) -> Option<usize> {
        let last = last_name_token(roster_name)?;
        let mut hits = self.players.iter().enumerate().filter(|(_, p)| {
            p.team == team && last_name_token(&p.name).as_deref() == Some(last.as_str())
        });
        let (first, _) = hits.next()?;
        if hits.next().is_some() {
            debug!(
                "last-name fallback for '{}' is ambiguous on {}",
                roster_name, team
            );
            return None;
        }
        Some(first)
    }

    /// The candidate on `team`, else the first candidate.
    fn pick_by_team(&self, candidates: &[usize], team: &str) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .find(|&i| self.players[i].team == team)
            .or_else(|| candidates.first().copied())
    }
}

// ---------------------------------------------------------------------------
// Roster reconciliation
// ---------------------------------------------------------------------------

/// A roster entry paired with the canonical record it resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPlayer {
    pub entry: RosterEntry,
    pub stat: PlayerSeasonStat,
    pub strategy: MatchStrategy,
}

/// Result of resolving a whole fantasy roster.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RosterResolution {
    pub matched: Vec<MatchedPlayer>,
    pub unmatched: Vec<RosterEntry>,
}

impl RosterResolution {
    /// Fraction of entries that resolved, 1.0 for an empty roster.
    pub fn match_rate(&self) -> f64 {
        let total = self.matched.len() + self.unmatched.len();
        if total == 0 {
            return 1.0;
        }
        self.matched.len() as f64 / total as f64
    }

    /// Category lines for the matched players, in roster order.
    pub fn lines(&self) -> Vec<CategoryLine> {
        self.matched
            .iter()
            .map(|m| CategoryLine::from_stat(&m.stat))
            .collect()
    }
}

/// Resolve every entry of a roster, keeping roster order.
pub fn resolve_roster(resolver: &Resolver<'_>, entries: &[RosterEntry]) -> RosterResolution {
    let mut out = RosterResolution::default();
    for entry in entries {
        match resolver.resolve_entry(entry) {
            Resolution::Matched {
                player, strategy, ..
            } => out.matched.push(MatchedPlayer {
                entry: entry.clone(),
                stat: player.clone(),
                strategy,
            }),
            Resolution::Unmatched => out.unmatched.push(entry.clone()),
        }
    }
    if !out.unmatched.is_empty() {
        debug!(
            "{} of {} roster entries unmatched",
            out.unmatched.len(),
            entries.len()
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Library root: the 9-category analytics engine. Pure computation over
// in-memory snapshots; loading, configuration and output live in the app.

pub mod boxscore;
pub mod category;
pub mod composite;
pub mod history;
pub mod identity;
pub mod line;
pub mod lineup;
pub mod matchup;
pub mod projection;
pub mod quality;
pub mod schedule;
pub mod stats;
pub mod waiver;
pub mod zscore;

pub use category::{round_to, Category, CategoryMap};
pub use identity::{normalize_name, ManualOverrides, Resolver, TeamNameMap};
pub use line::CategoryLine;
pub use schedule::{LeagueSchedule, PeriodId, PeriodSchedule};
pub use stats::{PlayerSeasonStat, RosterEntry};

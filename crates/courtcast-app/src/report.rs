// Plain-text rendering of command results for the terminal.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use courtcast_core::category::Category;
use courtcast_core::matchup::Outcome;
use courtcast_core::projection::TeamProjection;
use courtcast_core::quality::ValidationStatus;
use courtcast_core::stats::PlayerSeasonStat;
use courtcast_core::waiver::{Impact, RankedPlayer, SwapResult, UpgradeRow, UpgradeVerdict};
use courtcast_core::zscore::ZScoreRow;

use crate::engine::{HistoryReport, LineupReport, MatchupReport, ValidateReport};

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    f(&mut out).map(|()| out).unwrap_or_default()
}

/// Category total as shown in tables: percentages to 3 places, counts to 1.
pub fn format_value(cat: Category, value: f64) -> String {
    if cat.is_percentage() {
        format!("{value:.3}")
    } else {
        format!("{value:.1}")
    }
}

fn format_z(z: Option<f64>) -> String {
    z.map(|v| format!("{v:+.2}")).unwrap_or_else(|| "-".to_string())
}

fn category_header(out: &mut String) -> fmt::Result {
    for cat in Category::ALL {
        write!(out, " {:>7}", cat.label())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

pub fn rankings(rows: &[RankedPlayer], period: u32) -> String {
    render(|out| {
        writeln!(out, "Rankings for period {period} ({} players)", rows.len())?;
        write!(out, "{:>3}  {:<24} {:<18} {:>2} {:>6} {:>6}", "#", "Player", "Team", "G", "Comp", "Adj")?;
        category_header(out)?;
        writeln!(out)?;
        for (i, r) in rows.iter().enumerate() {
            write!(
                out,
                "{:>3}  {:<24} {:<18} {:>2} {:>6.2} {:>6.2}",
                i + 1,
                r.name,
                r.team,
                r.period_games,
                r.composite,
                r.schedule_adjusted
            )?;
            for cat in Category::ALL {
                write!(out, " {:>7}", format_z(r.z[cat]))?;
            }
            writeln!(out)?;
        }
        Ok(())
    })
}

pub fn best_available(rows: &[ZScoreRow], cat: Category) -> String {
    render(|out| {
        writeln!(out, "Best available free agents: {}", cat.label())?;
        for (i, r) in rows.iter().enumerate() {
            let value = r.line.value(cat).map(|v| format_value(cat, v)).unwrap_or_default();
            writeln!(
                out,
                "{:>3}  {:<24} {:<18} {:>8} {:>7}",
                i + 1,
                r.name,
                r.team,
                value,
                format_z(r.z(cat))
            )?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Projections and matchups
// ---------------------------------------------------------------------------

fn projection_row(out: &mut String, p: &TeamProjection) -> fmt::Result {
    write!(out, "{:<24} {:>3}", p.team_name, p.games_used())?;
    for cat in Category::ALL {
        write!(out, " {:>7}", format_value(cat, p.total(cat)))?;
    }
    writeln!(out)
}

pub fn projections(all: &BTreeMap<String, TeamProjection>, period: u32) -> String {
    render(|out| {
        writeln!(out, "Projected totals for period {period}")?;
        write!(out, "{:<24} {:>3}", "Team", "GP")?;
        category_header(out)?;
        writeln!(out)?;
        for p in all.values() {
            projection_row(out, p)?;
        }
        Ok(())
    })
}

pub fn matchup(report: &MatchupReport) -> String {
    let r = &report.result;
    render(|out| {
        writeln!(out, "Period {}: {}", report.period, r)?;
        writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>8}  Edge",
            "Cat", r.team_a, r.team_b, "Margin"
        )?;
        for c in &r.comparisons {
            let edge = match c.winner {
                Outcome::TeamA => r.team_a.as_str(),
                Outcome::TeamB => r.team_b.as_str(),
                Outcome::Tie => "tie",
            };
            writeln!(
                out,
                "{:<8} {:>10} {:>10} {:>8}  {}",
                c.category.label(),
                format_value(c.category, c.team_a_value),
                format_value(c.category, c.team_b_value),
                format_value(c.category, c.margin),
                edge
            )?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

pub fn lineup(report: &LineupReport) -> String {
    let plan = &report.plan;
    render(|out| {
        writeln!(
            out,
            "Lineup for period {}: {}/{} GP used, {} active slots",
            report.period, plan.total_games, plan.gp_max, plan.active_slots
        )?;
        if report.budget.fits() {
            writeln!(
                out,
                "Available starts {} fit under the cap.",
                report.budget.available_starts
            )?;
        } else {
            writeln!(
                out,
                "Available starts {}: {} must be benched.",
                report.budget.available_starts,
                report.budget.excess()
            )?;
        }
        for entry in &report.unmatched {
            writeln!(out, "  unmatched: {} ({})", entry.name, entry.team)?;
        }
        writeln!(out)?;

        for day in &plan.days {
            writeln!(
                out,
                "{} {}  playing {}, starting {}  (GP {})",
                day.date,
                day.date.format("%a"),
                day.playing,
                day.started(),
                day.cumulative_games
            )?;
            if !day.starters.is_empty() {
                writeln!(out, "    start: {}", day.starters.join(", "))?;
            }
            if !day.benched.is_empty() {
                let benched: Vec<String> = day
                    .benched
                    .iter()
                    .map(|b| format!("{} ({:+.2})", b.name, b.value))
                    .collect();
                writeln!(out, "    bench: {}", benched.join(", "))?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Games per player:")?;
        for (name, games) in &plan.effective_games {
            writeln!(out, "  {name:<24} {games}")?;
        }

        writeln!(out)?;
        write!(out, "{:<24} {:>3}", "Projected", "GP")?;
        category_header(out)?;
        writeln!(out)?;
        projection_row(out, &report.projection)?;

        if !report.streaming.is_empty() {
            writeln!(out)?;
            writeln!(out, "Streaming options:")?;
            for day in &report.streaming {
                let names: Vec<String> = day
                    .candidates
                    .iter()
                    .map(|c| format!("{} ({}, {:+.2})", c.name, c.team, c.composite))
                    .collect();
                writeln!(
                    out,
                    "  {} {} open: {}",
                    day.date,
                    day.open_slots,
                    if names.is_empty() {
                        "no free agents playing".to_string()
                    } else {
                        names.join(", ")
                    }
                )?;
            }
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Waiver moves
// ---------------------------------------------------------------------------

pub fn upgrades(rows: &[UpgradeRow]) -> String {
    render(|out| {
        writeln!(
            out,
            "{:<24} {:>6}  {:<24} {:>6} {:>6}  Verdict",
            "Current", "Comp", "Best FA", "Comp", "Gain"
        )?;
        for r in rows {
            let verdict = match r.verdict {
                UpgradeVerdict::Clear => "upgrade",
                UpgradeVerdict::Marginal => "marginal",
                UpgradeVerdict::NoUpgrade => "keep",
            };
            writeln!(
                out,
                "{:<24} {:>6.2}  {:<24} {:>6.2} {:>+6.2}  {}",
                r.current, r.current_composite, r.best_free_agent, r.free_agent_composite, r.gain, verdict
            )?;
        }
        Ok(())
    })
}

pub fn swap(result: &SwapResult) -> String {
    render(|out| {
        writeln!(
            out,
            "Swap impact for {} (period {})",
            result.before.team_name, result.before.period
        )?;
        for name in &result.missing_drops {
            writeln!(out, "  not on roster: {name}")?;
        }
        writeln!(out, "{:<8} {:>9} {:>9} {:>9}", "Cat", "Before", "After", "Change")?;
        for d in &result.deltas {
            let marker = match d.impact {
                Impact::Better => "+",
                Impact::Worse => "-",
                Impact::Unchanged => "",
            };
            writeln!(
                out,
                "{:<8} {:>9} {:>9} {:>9} {}",
                d.category.label(),
                format_value(d.category, d.before),
                format_value(d.category, d.after),
                format_value(d.category, d.change),
                marker
            )?;
        }
        if let (Some(before), Some(after)) = (&result.matchup_before, &result.matchup_after) {
            writeln!(out)?;
            writeln!(out, "Matchup vs {}: {} -> {}", before.team_b, before.record(), after.record())?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

pub fn validate(report: &ValidateReport) -> String {
    render(|out| {
        writeln!(out, "Data quality: {}", report.quality.summary())?;
        for check in &report.quality.checks {
            let mark = if check.passed { "PASS" } else { "FAIL" };
            writeln!(out, "  [{mark}] {}: {}", check.name, check.detail)?;
        }

        let xref = &report.cross_reference;
        writeln!(out)?;
        writeln!(
            out,
            "Cross-reference: {}% clean ({} clean, {} team mismatch, {} name mismatch, {} not in league)",
            xref.clean_pct,
            xref.count(ValidationStatus::Clean),
            xref.count(ValidationStatus::MismatchConfirmed),
            xref.count(ValidationStatus::NameMismatch),
            xref.count(ValidationStatus::NotInLeague)
        )?;
        if !xref.foreign_teams.is_empty() {
            let teams: Vec<&str> = xref.foreign_teams.iter().map(String::as_str).collect();
            writeln!(out, "  non-conference teams: {}", teams.join(", "))?;
        }
        for issue in xref.issues() {
            writeln!(
                out,
                "  {:?}: {} ({}, {} G): {}",
                issue.status, issue.name, issue.team, issue.games, issue.detail
            )?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Aggregation and history
// ---------------------------------------------------------------------------

pub fn players(players: &[PlayerSeasonStat]) -> String {
    render(|out| {
        writeln!(
            out,
            "{:<24} {:<18} {:>3} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
            "Player", "Team", "G", "MPG", "PPG", "RPG", "APG", "SPG", "BPG", "TOPG"
        )?;
        for p in players {
            let rate = |v: Option<f64>| v.map(|x| format!("{x:.1}")).unwrap_or_default();
            writeln!(
                out,
                "{:<24} {:<18} {:>3} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
                p.name,
                p.team,
                p.games,
                rate(p.mpg),
                rate(p.ppg),
                rate(p.rpg),
                rate(p.apg),
                rate(p.spg),
                rate(p.bpg),
                rate(p.topg)
            )?;
        }
        Ok(())
    })
}

pub fn history(report: &HistoryReport) -> String {
    render(|out| {
        writeln!(out, "History for {}", report.team)?;
        if report.lines.is_empty() {
            writeln!(out, "  no standings found")?;
        } else {
            write!(out, "{:>6} {:>7}", "Period", "W-L-T")?;
            category_header(out)?;
            writeln!(out)?;
            for line in &report.lines {
                let record = format!("{}-{}-{}", line.wins, line.losses, line.ties);
                write!(out, "{:>6} {:>7}", line.period, record)?;
                for cat in Category::ALL {
                    let v = line.values[cat]
                        .map(|v| format_value(cat, v))
                        .unwrap_or_else(|| "-".to_string());
                    write!(out, " {v:>7}")?;
                }
                writeln!(out)?;
            }
        }

        if let Some(period) = report.rank_period {
            writeln!(out)?;
            writeln!(out, "Category ranks, period {period}")?;
            write!(out, "{:<24}", "Team")?;
            category_header(out)?;
            writeln!(out)?;
            for (team, ranks) in &report.ranks {
                write!(out, "{team:<24}")?;
                for cat in Category::ALL {
                    write!(out, " {:>7}", ranks[cat])?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtcast_core::category::CategoryMap;
    use std::collections::HashMap;

    #[test]
    fn render_keeps_text_only_when_writing_succeeds() {
        assert_eq!(render(|out| writeln!(out, "ok")), "ok\n");
        assert_eq!(
            render(|out| {
                out.push_str("partial");
                Err(fmt::Error)
            }),
            ""
        );
    }

    #[test]
    fn values_format_by_category_kind() {
        assert_eq!(format_value(Category::AdjFgPct, 0.53751), "0.538");
        assert_eq!(format_value(Category::Points, 152.04), "152.0");
        assert_eq!(format_z(Some(1.5)), "+1.50");
        assert_eq!(format_z(Some(-0.25)), "-0.25");
        assert_eq!(format_z(None), "-");
    }

    #[test]
    fn projection_table_lists_every_team() {
        let team = |name: &str, pts: f64| TeamProjection {
            team_name: name.into(),
            period: 15,
            totals: CategoryMap::from_fn(|c| if c == Category::Points { pts } else { 0.0 }),
            lines: Vec::new(),
            games_per_player: HashMap::new(),
        };
        let mut all = BTreeMap::new();
        all.insert("Alpha".to_string(), team("Alpha", 120.0));
        all.insert("Beta".to_string(), team("Beta", 99.5));
        let text = projections(&all, 15);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("period 15"));
        assert!(lines[2].starts_with("Alpha"));
        assert!(lines[2].contains("120.0"));
        assert!(lines[3].contains("99.5"));
    }
}

//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::model::{BadgeColor, Train};
use crate::notice::Notice;
use crate::reports::{
    Alert, AlertStats, DashboardReport, InductionEntry, MaintenanceActivity, PerformanceReport, by_severity,
    filter_roster,
};
use crate::roster::RosterState;
use crate::stabling::StablingState;

pub const ROSTER_HEADERS: [&str; 8] = [
    "Train ID",
    "Condition",
    "Mileage (KM This Month)",
    "Has Branding",
    "Branding Days Completed",
    "Branding Days Required",
    "Branding Expiry Date",
    "Status",
];

pub const NO_STABLING_GEOMETRY: &str = "No stabling geometry available.";

impl BadgeColor {
    #[must_use]
    pub fn ansi_code(self) -> &'static str {
        match self {
            Self::Gray => "90",
            Self::Yellow => "33",
            Self::Green => "32",
            Self::Red => "31",
        }
    }
}

/// One table cell; badge cells are coloured after padding so ANSI escapes
/// never count toward column width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub badge: Option<BadgeColor>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), badge: None }
    }

    fn badge(text: impl Into<String>, color: BadgeColor) -> Self {
        Self { text: text.into(), badge: Some(color) }
    }
}

/// Cells for one roster row in `ROSTER_HEADERS` order.
#[must_use]
pub fn roster_row(train: &Train) -> Vec<Cell> {
    vec![
        Cell::plain(train.train_id.to_string()),
        Cell::plain(train.condition_label()),
        Cell::plain(train.mileage_kms_this_month.to_string()),
        Cell::plain(if train.has_branding { "Yes" } else { "No" }),
        Cell::plain(train.branding_days_completed.map(|d| d.to_string()).unwrap_or_default()),
        Cell::plain(train.branding_days_required.map(|d| d.to_string()).unwrap_or_default()),
        Cell::plain(train.branding_expiry_date.as_deref().filter(|d| !d.is_empty()).unwrap_or("-")),
        Cell::badge(train.status.as_str(), train.status.badge()),
    ]
}

/// The roster table. The row under edit shows its draft marked with `*`.
#[must_use]
pub fn roster_table(state: &RosterState, color: bool) -> String {
    let rows: Vec<Vec<Cell>> = state
        .trains
        .iter()
        .map(|train| {
            let mut row = roster_row(train);
            if let Some(editor) = state.editor.as_ref().filter(|e| e.train_id == train.train_id) {
                row[7] = Cell::badge(format!("{}*", editor.draft), editor.draft.badge());
            }
            row
        })
        .collect();
    table(&ROSTER_HEADERS, &rows, color)
}

/// Left-aligned columns separated by two spaces.
#[must_use]
pub fn table(headers: &[&str], rows: &[Vec<Cell>], color: bool) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.text.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::plain(*h)).collect();
    push_line(&mut out, &header_cells, &widths, false);
    for row in rows {
        push_line(&mut out, row, &widths, color);
    }
    out
}

fn push_line(out: &mut String, cells: &[Cell], widths: &[usize], color: bool) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let padded = if i + 1 == cells.len() {
            cell.text.clone()
        } else {
            format!("{:<width$}", cell.text, width = *width)
        };
        match cell.badge {
            Some(badge) if color => line.push_str(&paint(&padded, badge)),
            _ => line.push_str(&padded),
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[must_use]
pub fn notice(notice: &Notice, color: bool) -> String {
    let badge = if notice.is_success() { BadgeColor::Green } else { BadgeColor::Red };
    let title = if color { paint(&notice.title, badge) } else { notice.title.clone() };
    format!("{title}: {}\n", notice.description)
}

#[must_use]
pub fn paint(text: &str, color: BadgeColor) -> String {
    format!("\x1b[{}m{text}\x1b[0m", color.ansi_code())
}

#[must_use]
pub fn timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"))
        .unwrap_or_else(|_| at.to_string())
}

// =============================================================================
// STABLING
// =============================================================================

#[must_use]
pub fn stabling_view(state: &StablingState) -> String {
    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}");
    }
    let Some(slots) = state.slots.as_ref().filter(|s| !s.is_empty()) else {
        out.push_str(NO_STABLING_GEOMETRY);
        out.push('\n');
        return out;
    };

    let rows: Vec<Vec<Cell>> = slots
        .iter()
        .map(|(slot, occupant)| {
            let train = occupant.as_ref().map_or_else(|| "-".to_owned(), ToString::to_string);
            vec![Cell::plain(slot.clone()), Cell::plain(train)]
        })
        .collect();
    out.push_str(&table(&["Slot", "Assigned Train"], &rows, false));
    if let Some(at) = state.last_updated {
        let _ = writeln!(out, "Last updated: {}", timestamp(at));
    }
    out
}

// =============================================================================
// REPORTS
// =============================================================================

#[must_use]
pub fn alerts_view(alerts: &[Alert], color: bool) -> String {
    let stats = AlertStats::from_alerts(alerts);
    let mut out = format!(
        "Critical Alerts: {}  Warnings: {}  Info: {}\n\n",
        stats.critical, stats.warnings, stats.info
    );
    let rows: Vec<Vec<Cell>> = by_severity(alerts)
        .into_iter()
        .map(|a| {
            vec![
                Cell::badge(a.severity.as_str(), a.severity.badge()),
                Cell::plain(a.train.clone()),
                Cell::plain(a.route.clone()),
                Cell::plain(a.time.clone()),
                Cell::plain(a.message.clone()),
            ]
        })
        .collect();
    out.push_str(&table(&["Type", "Train", "Route", "Time", "Message"], &rows, color));
    out
}

#[must_use]
pub fn maintenance_view(activities: &[MaintenanceActivity], color: bool) -> String {
    let rows: Vec<Vec<Cell>> = activities
        .iter()
        .map(|a| {
            vec![
                Cell::plain(a.train.clone()),
                Cell::plain(format!("{} Maintenance", a.kind)),
                Cell::plain(a.date.clone()),
                Cell::badge(a.status.as_str(), a.status.badge()),
            ]
        })
        .collect();
    table(&["Train", "Type", "Date", "Status"], &rows, color)
}

#[must_use]
pub fn performance_view(report: &PerformanceReport) -> String {
    let rows: Vec<Vec<Cell>> = report
        .daily
        .iter()
        .map(|d| {
            vec![
                Cell::plain(d.day.clone()),
                Cell::plain(d.service.to_string()),
                Cell::plain(d.maintenance.to_string()),
                Cell::plain(d.standby.to_string()),
            ]
        })
        .collect();
    let mut out = table(&["Day", "Service", "Maintenance", "Standby"], &rows, false);
    let totals = report.totals();
    let _ = writeln!(
        out,
        "\nTotals: service {} / maintenance {} / standby {}  (avg in service {:.1}/day)",
        totals.service, totals.maintenance, totals.standby, totals.average_in_service
    );
    let _ = writeln!(
        out,
        "Average efficiency: {}%  On-time performance: {}%  Passenger satisfaction: {}/5",
        report.stats.average_efficiency, report.stats.on_time_performance, report.stats.passenger_satisfaction
    );
    out
}

pub const INDUCTION_HEADERS: [&str; 10] = [
    "Rank",
    "Train ID",
    "Status",
    "Job Card",
    "Certificate",
    "Mileage",
    "Route",
    "Branding",
    "Reason",
    "Alerts",
];

/// Headline stats, the induction roster filtered by `search`, and the
/// decision breakdown of every listed train.
#[must_use]
pub fn dashboard_view(report: &DashboardReport, search: &str, color: bool) -> String {
    let stats = &report.stats;
    let fleet = &stats.fleet_status;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Trains deployed: {}  Maintenance cycles: {}  Branding missions: {}",
        stats.trains_deployed, stats.maintenance_cycles, stats.branding_missions
    );
    let _ = writeln!(
        out,
        "Fleet status: standby {}  backlog {}  active {}  SLA {}%\n",
        fleet.standby, fleet.backlog, fleet.active, fleet.sla
    );

    let entries = filter_roster(report.ranked(), search);
    if entries.is_empty() {
        out.push_str("No trains match the search.\n");
        return out;
    }
    let rows: Vec<Vec<Cell>> = entries.iter().map(|e| induction_row(e)).collect();
    out.push_str(&table(&INDUCTION_HEADERS, &rows, color));

    for entry in entries {
        if let Some(decision) = &entry.decision {
            let _ = writeln!(out, "\nDecision breakdown for train {} (ranked #{})", entry.train_id, entry.rank);
            let rows: Vec<Vec<Cell>> = decision
                .breakdown
                .iter()
                .map(|f| {
                    let score = if f.description.is_empty() {
                        f.score.to_string()
                    } else {
                        format!("{} ({})", f.score, f.description)
                    };
                    vec![
                        Cell::plain(f.objective.clone()),
                        Cell::plain(score),
                        Cell::plain(format!("{}%", f.weight)),
                        Cell::plain(format!("+{}", f.contribution)),
                    ]
                })
                .collect();
            out.push_str(&table(&["Objective", "Score", "Weight", "Contribution"], &rows, false));
            let _ = writeln!(out, "Final score: {}", decision.final_score);
        }
    }
    out
}

fn induction_row(entry: &InductionEntry) -> Vec<Cell> {
    let alert = entry
        .conflict
        .as_ref()
        .map_or_else(|| Cell::plain(""), |c| Cell::badge(c.kind.clone(), BadgeColor::Red));
    vec![
        Cell::plain(format!("#{}", entry.rank)),
        Cell::plain(entry.train_id.clone()),
        Cell::badge(entry.status.clone(), entry.status_badge()),
        Cell::badge(entry.job_card_status.clone(), entry.job_card_badge()),
        Cell::badge(entry.certificate_status.clone(), entry.certificate_badge()),
        Cell::plain(format!("{} km", entry.mileage)),
        Cell::plain(entry.route.clone()),
        Cell::plain(entry.branding.as_deref().unwrap_or("None")),
        Cell::plain(entry.reason.clone()),
        alert,
    ]
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

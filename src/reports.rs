//! Read-only fleet reports: alerts, maintenance logs, performance and the
//! induction dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! No backend endpoint serves these yet. Each report is a typed record set
//! behind `ReportSource`; `JsonDirReports` reads them from exported JSON
//! files. Summaries are always derived from the records, never stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::BadgeColor;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
}

// =============================================================================
// ALERTS
// =============================================================================

/// Unknown severities are kept verbatim and sort after `Info`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
    Other(String),
}

impl AlertSeverity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn badge(&self) -> BadgeColor {
        match self {
            Self::Critical => BadgeColor::Red,
            Self::Warning => BadgeColor::Yellow,
            Self::Info | Self::Other(_) => BadgeColor::Gray,
        }
    }
}

impl From<String> for AlertSeverity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Critical" => Self::Critical,
            "Warning" => Self::Warning,
            "Info" => Self::Info,
            _ => Self::Other(raw),
        }
    }
}

impl From<AlertSeverity> for String {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub message: String,
    /// Relative time as reported, e.g. `15 minutes ago`.
    pub time: String,
    pub train: String,
    pub route: String,
}

/// Unknown severities count as info.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub critical: usize,
    pub warnings: usize,
    pub info: usize,
}

impl AlertStats {
    #[must_use]
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut stats, alert| {
            match alert.severity {
                AlertSeverity::Critical => stats.critical += 1,
                AlertSeverity::Warning => stats.warnings += 1,
                AlertSeverity::Info | AlertSeverity::Other(_) => stats.info += 1,
            }
            stats
        })
    }
}

/// Alerts ordered most severe first; ties keep their reported order.
#[must_use]
pub fn by_severity(alerts: &[Alert]) -> Vec<&Alert> {
    let mut sorted: Vec<&Alert> = alerts.iter().collect();
    sorted.sort_by(|a, b| a.severity.cmp(&b.severity));
    sorted
}

// =============================================================================
// MAINTENANCE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaintenanceStatus {
    Completed,
    InProgress,
    Scheduled,
    Other(String),
}

impl MaintenanceStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
            Self::Scheduled => "Scheduled",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn badge(&self) -> BadgeColor {
        match self {
            Self::Completed => BadgeColor::Green,
            Self::InProgress => BadgeColor::Yellow,
            Self::Scheduled | Self::Other(_) => BadgeColor::Gray,
        }
    }
}

impl From<String> for MaintenanceStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Completed" => Self::Completed,
            "In Progress" => Self::InProgress,
            "Scheduled" => Self::Scheduled,
            _ => Self::Other(raw),
        }
    }
}

impl From<MaintenanceStatus> for String {
    fn from(status: MaintenanceStatus) -> Self {
        match status {
            MaintenanceStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceActivity {
    pub train: String,
    /// Scheduled, Emergency, Preventive, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub status: MaintenanceStatus,
}

impl MaintenanceActivity {
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.kind == "Emergency"
    }
}

/// Activity count per status label.
#[must_use]
pub fn maintenance_by_status(activities: &[MaintenanceActivity]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.status.as_str().to_owned()).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// PERFORMANCE
// =============================================================================

/// Trains per status on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetMixDay {
    pub day: String,
    pub service: u32,
    pub maintenance: u32,
    pub standby: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub average_efficiency: f64,
    pub on_time_performance: f64,
    pub passenger_satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub daily: Vec<FleetMixDay>,
    pub stats: PerformanceStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixTotals {
    pub service: u64,
    pub maintenance: u64,
    pub standby: u64,
    pub average_in_service: f64,
    pub peak_service_day: Option<String>,
}

impl PerformanceReport {
    #[must_use]
    pub fn totals(&self) -> MixTotals {
        let service: u64 = self.daily.iter().map(|d| u64::from(d.service)).sum();
        let maintenance: u64 = self.daily.iter().map(|d| u64::from(d.maintenance)).sum();
        let standby: u64 = self.daily.iter().map(|d| u64::from(d.standby)).sum();
        let average_in_service = if self.daily.is_empty() {
            0.0
        } else {
            service as f64 / self.daily.len() as f64
        };
        // First day wins a tie.
        let peak_service_day = self
            .daily
            .iter()
            .rev()
            .max_by_key(|d| d.service)
            .map(|d| d.day.clone());
        MixTotals { service, maintenance, standby, average_in_service, peak_service_day }
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Headline fleet counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetStatusSummary {
    pub standby: u32,
    pub backlog: u32,
    pub active: u32,
    /// Service level, in percent.
    pub sla: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub trains_deployed: u32,
    pub maintenance_cycles: u32,
    pub branding_missions: u32,
    pub fleet_status: FleetStatusSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// e.g. `MAINTENANCE_WARNING`, `MAINTENANCE_CRITICAL`.
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
}

/// One weighted objective behind an induction score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFactor {
    pub objective: String,
    /// Out of 100.
    pub score: f64,
    #[serde(default)]
    pub description: String,
    /// Percent of the final score.
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductionDecision {
    pub final_score: f64,
    #[serde(default)]
    pub breakdown: Vec<DecisionFactor>,
}

impl InductionDecision {
    #[must_use]
    pub fn contribution_total(&self) -> f64 {
        self.breakdown.iter().map(|f| f.contribution).sum()
    }
}

/// A train on the induction roster, ranked by the planning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductionEntry {
    pub rank: u32,
    pub train_id: String,
    /// Service, Standby, Maintenance.
    pub status: String,
    pub job_card_status: String,
    pub certificate_status: String,
    pub mileage: f64,
    pub route: String,
    #[serde(default)]
    pub branding: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub conflict: Option<Conflict>,
    #[serde(default)]
    pub decision: Option<InductionDecision>,
}

impl InductionEntry {
    #[must_use]
    pub fn status_badge(&self) -> BadgeColor {
        match self.status.as_str() {
            "Service" => BadgeColor::Green,
            "Standby" => BadgeColor::Yellow,
            _ => BadgeColor::Red,
        }
    }

    #[must_use]
    pub fn job_card_badge(&self) -> BadgeColor {
        if self.job_card_status == "Closed" { BadgeColor::Gray } else { BadgeColor::Red }
    }

    #[must_use]
    pub fn certificate_badge(&self) -> BadgeColor {
        if self.certificate_status == "Valid" { BadgeColor::Gray } else { BadgeColor::Red }
    }

    fn matches(&self, needle: &str) -> bool {
        self.train_id.to_lowercase().contains(needle)
            || self.route.to_lowercase().contains(needle)
            || self.conflict.as_ref().is_some_and(|c| c.details.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub stats: DashboardStats,
    pub roster: Vec<InductionEntry>,
}

impl DashboardReport {
    /// Roster entries in rank order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&InductionEntry> {
        let mut ranked: Vec<&InductionEntry> = self.roster.iter().collect();
        ranked.sort_by_key(|e| e.rank);
        ranked
    }
}

/// Entries whose train id, route or conflict details contain `term`,
/// ignoring case. A blank term keeps every entry.
#[must_use]
pub fn filter_roster<'a>(
    entries: impl IntoIterator<Item = &'a InductionEntry>,
    term: &str,
) -> Vec<&'a InductionEntry> {
    let needle = term.trim().to_lowercase();
    entries.into_iter().filter(|e| e.matches(&needle)).collect()
}

// =============================================================================
// SOURCES
// =============================================================================

#[async_trait::async_trait]
pub trait ReportSource: Send + Sync {
    async fn alerts(&self) -> Result<Vec<Alert>, ReportError>;
    async fn maintenance(&self) -> Result<Vec<MaintenanceActivity>, ReportError>;
    async fn performance(&self) -> Result<PerformanceReport, ReportError>;
    async fn dashboard(&self) -> Result<DashboardReport, ReportError>;
}

/// Reads `alerts.json`, `maintenance.json`, `performance.json` and
/// `dashboard.json` from a directory.
pub struct JsonDirReports {
    dir: PathBuf,
}

impl JsonDirReports {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, ReportError> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ReportError::Io { path: path.clone(), source })?;
        serde_json::from_slice(&bytes).map_err(|source| ReportError::Json { path, source })
    }
}

#[async_trait::async_trait]
impl ReportSource for JsonDirReports {
    async fn alerts(&self) -> Result<Vec<Alert>, ReportError> {
        self.read("alerts.json").await
    }

    async fn maintenance(&self) -> Result<Vec<MaintenanceActivity>, ReportError> {
        self.read("maintenance.json").await
    }

    async fn performance(&self) -> Result<PerformanceReport, ReportError> {
        self.read("performance.json").await
    }

    async fn dashboard(&self) -> Result<DashboardReport, ReportError> {
        self.read("dashboard.json").await
    }
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;

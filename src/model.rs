//! Train records and the request bodies built from them.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend owns train inventory; these types are the client's transient
//! copy. `train_id` is the reconciliation key for every status update.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;
use time::macros::format_description;

// =============================================================================
// STATUS
// =============================================================================

/// Service status assigned to a train.
///
/// Values outside the four known states are kept verbatim so they render as
/// received, but they take the `Unassigned` badge style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainStatus {
    #[default]
    Unassigned,
    Standby,
    Service,
    Maintenance,
    Unrecognized(String),
}

impl TrainStatus {
    /// The four assignable states, in menu order.
    pub const ASSIGNABLE: [TrainStatus; 4] =
        [TrainStatus::Unassigned, TrainStatus::Standby, TrainStatus::Service, TrainStatus::Maintenance];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unassigned => "UNASSIGNED",
            Self::Standby => "STANDBY",
            Self::Service => "SERVICE",
            Self::Maintenance => "MAINTENANCE",
            Self::Unrecognized(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Badge colour for this status.
    #[must_use]
    pub fn badge(&self) -> BadgeColor {
        match self {
            Self::Standby => BadgeColor::Yellow,
            Self::Service => BadgeColor::Green,
            Self::Maintenance => BadgeColor::Red,
            Self::Unassigned | Self::Unrecognized(_) => BadgeColor::Gray,
        }
    }
}

impl From<String> for TrainStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "UNASSIGNED" => Self::Unassigned,
            "STANDBY" => Self::Standby,
            "SERVICE" => Self::Service,
            "MAINTENANCE" => Self::Maintenance,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<TrainStatus> for String {
    fn from(status: TrainStatus) -> Self {
        match status {
            TrainStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}` (expected UNASSIGNED, STANDBY, SERVICE or MAINTENANCE)")]
pub struct ParseStatusError(pub String);

/// Strict, case-insensitive parse used for operator input. Only the four
/// assignable states are accepted.
impl FromStr for TrainStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match TrainStatus::from(s.trim().to_ascii_uppercase()) {
            TrainStatus::Unrecognized(_) => Err(ParseStatusError(s.to_owned())),
            known => Ok(known),
        }
    }
}

/// Status badge colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Gray,
    Yellow,
    Green,
    Red,
}

// =============================================================================
// TRAIN
// =============================================================================

/// One row of the roster as returned by `/api/get_trains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub train_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mileage_kms_this_month: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_fit_for_service: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_branding: bool,
    #[serde(default)]
    pub branding_days_completed: Option<u32>,
    #[serde(default)]
    pub branding_days_required: Option<u32>,
    #[serde(default)]
    pub branding_expiry_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TrainStatus,
}

impl Train {
    /// A fit, unbranded, unassigned train with zero mileage.
    #[must_use]
    pub fn new(train_id: i64) -> Self {
        Self {
            train_id,
            model: None,
            mileage_kms_this_month: 0.0,
            is_fit_for_service: true,
            has_branding: false,
            branding_days_completed: None,
            branding_days_required: None,
            branding_expiry_date: None,
            status: TrainStatus::Unassigned,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: TrainStatus) -> Self {
        self.status = status;
        self
    }

    /// `OK` when fit for service, otherwise `Maintenance`.
    #[must_use]
    pub fn condition_label(&self) -> &'static str {
        if self.is_fit_for_service { "OK" } else { "Maintenance" }
    }

    /// Branding expiry parsed as an ISO date; `None` when absent or malformed.
    #[must_use]
    pub fn expiry_date(&self) -> Option<Date> {
        self.branding_expiry_date.as_deref().and_then(parse_iso_date)
    }

    /// The body sent to `/api/update_status` for this row.
    #[must_use]
    pub fn status_update(&self) -> StatusUpdate {
        StatusUpdate { train_id: self.train_id, status: self.status.clone() }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// Body of `POST /api/update_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub train_id: i64,
    pub status: TrainStatus,
}

/// Typed body of `POST /api/addtrain` built by the add-train form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrain {
    pub train_id: i64,
    pub is_fit_for_service: bool,
    pub mileage_kms_this_month: f64,
    pub has_branding: bool,
    pub branding_days_completed: u32,
    pub branding_days_required: u32,
    pub branding_expiry_date: Option<String>,
}

/// Loosely typed body of `POST /api/trains`: every field is the raw text the
/// operator typed except the two toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainSubmission {
    pub train_id: String,
    pub model: String,
    pub mileage_kms_this_month: String,
    pub is_fit_for_service: bool,
    pub has_branding: bool,
    pub branding_days_completed: String,
    pub branding_days_required: String,
    pub branding_expiry_date: String,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;

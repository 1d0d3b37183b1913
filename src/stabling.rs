//! Stabling geometry: which train occupies each yard slot.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api::FleetApi;
use crate::error::FleetError;

/// Slot name to occupant; `None` is an empty slot.
pub type StablingMap = BTreeMap<String, Option<SlotOccupant>>;

/// Backends identify parked trains either by numeric id or by a fleet code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotOccupant {
    Id(i64),
    Code(String),
}

impl fmt::Display for SlotOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

/// Stabling view state.
#[derive(Debug, Clone, Default)]
pub struct StablingState {
    pub slots: Option<StablingMap>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<OffsetDateTime>,
}

impl StablingState {
    pub fn begin_refresh(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// A failed refresh keeps the previous slots so the last good picture
    /// stays available next to the error.
    pub fn finish_refresh(&mut self, result: Result<StablingMap, FleetError>, now: OffsetDateTime) {
        self.loading = false;
        match result {
            Ok(slots) => {
                self.slots = Some(slots);
                self.last_updated = Some(now);
            }
            Err(e) => self.error = Some(e.user_message()),
        }
    }

    /// Fetch the current geometry.
    pub async fn refresh(&mut self, api: &dyn FleetApi) {
        self.begin_refresh();
        let result = api.stabling_geometry().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "stabling geometry refresh failed");
        }
        self.finish_refresh(result, OffsetDateTime::now_utc());
    }

    /// True when there is nothing to show (never loaded or no slots).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.as_ref().is_none_or(BTreeMap::is_empty)
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.as_ref().map_or(0, |slots| slots.values().filter(|o| o.is_some()).count())
    }
}

#[cfg(test)]
#[path = "stabling_test.rs"]
mod tests;

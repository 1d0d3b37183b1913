//! Status reconciliation: load the roster, edit locally, push it back.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Reconciler` owns one `RosterState` and drives it with results from the
//! backend. Backend calls are best-effort: nothing is retried, and a batch
//! save is not transactional. Partial failure leaves the backend mixed.

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod reconcile_test;

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::api::FleetApi;
use crate::error::{ErrorCode, FleetError};
use crate::model::{StatusUpdate, TrainStatus};
use crate::notice::Notice;
use crate::roster::{RosterAction, RosterState};

pub const SAVE_SUCCESS_TITLE: &str = "Train List successfully updated";
pub const SAVE_SUCCESS_DESCRIPTION: &str =
    "All train statuses have been saved. You can check them on the Train List page now.";
pub const SAVE_REJECTED_MESSAGE: &str = "Failed to update some train statuses";

/// Result of one `save_all` batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub attempted: usize,
    pub failed: usize,
    /// First failure in roster order.
    pub first_error: Option<String>,
}

impl SaveOutcome {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// The single aggregate notice for this batch.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match &self.first_error {
            None => Notice::success(SAVE_SUCCESS_TITLE, SAVE_SUCCESS_DESCRIPTION),
            Some(message) => Notice::failure(message.clone()),
        }
    }
}

pub struct Reconciler {
    api: Arc<dyn FleetApi>,
    state: RosterState,
}

impl Reconciler {
    #[must_use]
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        Self { api, state: RosterState::default() }
    }

    #[must_use]
    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RosterState {
        &mut self.state
    }

    pub fn dispatch(&mut self, action: RosterAction) {
        self.state.apply(action);
    }

    /// Fetch the roster. Failures are logged and leave the roster empty; no
    /// notice is raised.
    pub async fn load_roster(&mut self) {
        self.dispatch(RosterAction::LoadStarted);
        match self.api.get_trains().await {
            Ok(trains) => {
                tracing::info!(count = trains.len(), "roster loaded");
                self.dispatch(RosterAction::Loaded(trains));
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "roster load failed");
                self.dispatch(RosterAction::LoadFailed(e.to_string()));
            }
        }
    }

    pub fn begin_edit(&mut self, train_id: i64) {
        self.dispatch(RosterAction::BeginEdit(train_id));
    }

    pub fn select_status(&mut self, status: TrainStatus) {
        self.dispatch(RosterAction::SelectStatus(status));
    }

    pub fn commit_edit(&mut self, train_id: i64, status: TrainStatus) {
        self.dispatch(RosterAction::CommitEdit { train_id, status });
    }

    pub fn cancel_edit(&mut self) {
        self.dispatch(RosterAction::CancelEdit);
    }

    /// Push every row's current status, concurrently, and raise exactly one
    /// notice once the whole batch has settled.
    pub async fn save_all(&mut self) -> SaveOutcome {
        self.dispatch(RosterAction::SaveStarted);
        let updates: Vec<StatusUpdate> = self.state.trains.iter().map(|t| t.status_update()).collect();

        let api = Arc::clone(&self.api);
        let results = join_all(updates.iter().map(|update| api.update_status(update))).await;

        let mut failed = 0;
        let mut first_error = None;
        for (update, result) in updates.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(train_id = update.train_id, error = %e, "status update failed");
                failed += 1;
                first_error.get_or_insert_with(|| save_error_message(&e));
            }
        }

        let outcome = SaveOutcome { attempted: updates.len(), failed, first_error };
        tracing::info!(attempted = outcome.attempted, failed = outcome.failed, "status batch settled");
        self.dispatch(RosterAction::SaveFinished(outcome.notice()));
        outcome
    }

    /// Replace the roster with the model's current assignment. Unsaved local
    /// edits are discarded. On failure the roster is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the assignment could not be fetched.
    pub async fn assign_via_model(&mut self) -> Result<(), FleetError> {
        match self.api.current_model_assignment().await {
            Ok(trains) => {
                tracing::info!(count = trains.len(), "model assignment received");
                self.dispatch(RosterAction::AssignmentReceived(trains));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "model assignment fetch failed");
                Err(e)
            }
        }
    }

    /// Mark every row `UNASSIGNED` locally and fire the backend reset without
    /// waiting for it. The returned handle may be dropped; its result is only
    /// logged. Must be called inside a tokio runtime.
    pub fn unassign_all(&mut self) -> JoinHandle<()> {
        self.dispatch(RosterAction::UnassignAll);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            if let Err(e) = api.reset_status().await {
                tracing::warn!(error = %e, code = e.error_code(), "status reset request failed");
            }
        })
    }
}

fn save_error_message(error: &FleetError) -> String {
    match error {
        FleetError::Status { .. } => SAVE_REJECTED_MESSAGE.to_owned(),
        other => other.to_string(),
    }
}

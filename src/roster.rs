//! Roster store for the status-assignment view.
//!
//! DESIGN
//! ======
//! All mutation goes through `RosterState::apply`, one `RosterAction` at a
//! time. The store holds at most one `EditSession`; beginning an edit on any
//! row replaces the previous session and its unsaved draft.

#[cfg(test)]
#[path = "roster_test.rs"]
mod roster_test;

use crate::model::{Train, TrainStatus};
use crate::notice::Notice;

/// The single row currently being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub train_id: i64,
    pub draft: TrainStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RosterAction {
    LoadStarted,
    Loaded(Vec<Train>),
    LoadFailed(String),
    /// Open the editor on a row, seeding the draft with its current status.
    BeginEdit(i64),
    /// Change the draft of the open editor.
    SelectStatus(TrainStatus),
    /// Write `status` into the row and close the editor.
    CommitEdit { train_id: i64, status: TrainStatus },
    CancelEdit,
    /// Wholesale replacement from the model assignment endpoint.
    AssignmentReceived(Vec<Train>),
    UnassignAll,
    SaveStarted,
    SaveFinished(Notice),
}

#[derive(Clone, Debug, Default)]
pub struct RosterState {
    pub trains: Vec<Train>,
    pub loading: bool,
    /// Last load failure; the roster is left empty when set.
    pub load_error: Option<String>,
    pub editor: Option<EditSession>,
    pub saving: bool,
    pub notices: Vec<Notice>,
}

impl RosterState {
    pub fn apply(&mut self, action: RosterAction) {
        match action {
            RosterAction::LoadStarted => {
                self.loading = true;
                self.load_error = None;
            }
            RosterAction::Loaded(trains) => {
                self.loading = false;
                self.trains = trains;
                self.editor = None;
            }
            RosterAction::LoadFailed(message) => {
                self.loading = false;
                self.trains.clear();
                self.editor = None;
                self.load_error = Some(message);
            }
            RosterAction::BeginEdit(train_id) => {
                if let Some(train) = self.train(train_id) {
                    self.editor = Some(EditSession { train_id, draft: train.status.clone() });
                }
            }
            RosterAction::SelectStatus(status) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.draft = status;
                }
            }
            RosterAction::CommitEdit { train_id, status } => {
                for train in self.trains.iter_mut().filter(|t| t.train_id == train_id) {
                    train.status = status.clone();
                }
                self.editor = None;
            }
            RosterAction::CancelEdit => self.editor = None,
            RosterAction::AssignmentReceived(trains) => {
                self.trains = trains;
                self.editor = None;
            }
            RosterAction::UnassignAll => {
                for train in &mut self.trains {
                    train.status = TrainStatus::Unassigned;
                }
            }
            RosterAction::SaveStarted => self.saving = true,
            RosterAction::SaveFinished(notice) => {
                self.saving = false;
                self.notices.push(notice);
            }
        }
    }

    #[must_use]
    pub fn train(&self, train_id: i64) -> Option<&Train> {
        self.trains.iter().find(|t| t.train_id == train_id)
    }

    #[must_use]
    pub fn is_editing(&self, train_id: i64) -> bool {
        self.editor.as_ref().is_some_and(|e| e.train_id == train_id)
    }

    /// The commit action for the open editor's draft, if any.
    #[must_use]
    pub fn commit_draft(&self) -> Option<RosterAction> {
        self.editor
            .as_ref()
            .map(|e| RosterAction::CommitEdit { train_id: e.train_id, status: e.draft.clone() })
    }

    /// Drain pending notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

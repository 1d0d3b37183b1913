//! Shared fixtures for unit tests: an in-memory backend and an axum harness.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::api::FleetApi;
use crate::error::FleetError;
use crate::model::{StatusUpdate, Train, TrainStatus, TrainSubmission};
use crate::stabling::StablingMap;

#[must_use]
pub fn train(id: i64, status: TrainStatus) -> Train {
    Train::new(id).with_status(status)
}

/// In-memory `FleetApi` that records every call.
#[derive(Default)]
pub struct MockFleetApi {
    pub roster: Vec<Train>,
    pub assignment: Vec<Train>,
    pub fail_roster: bool,
    pub fail_assignment: bool,
    pub fail_reset: bool,
    /// Train ids whose status update is rejected.
    pub reject_updates: HashSet<i64>,
    /// Zero-based add-train call index that is rejected.
    pub reject_add_at: Option<usize>,
    pub submit_reply: Option<String>,
    pub stabling: Option<StablingMap>,

    pub updates: Mutex<Vec<StatusUpdate>>,
    pub added: Mutex<Vec<Value>>,
    pub submissions: Mutex<Vec<TrainSubmission>>,
    pub resets: AtomicUsize,
}

impl MockFleetApi {
    #[must_use]
    pub fn with_roster(roster: Vec<Train>) -> Self {
        Self { roster, ..Self::default() }
    }

    pub fn recorded_updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn recorded_adds(&self) -> Vec<Value> {
        self.added.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FleetApi for MockFleetApi {
    async fn get_trains(&self) -> Result<Vec<Train>, FleetError> {
        if self.fail_roster {
            return Err(FleetError::Transport("connection refused".into()));
        }
        Ok(self.roster.clone())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), FleetError> {
        self.updates.lock().unwrap().push(update.clone());
        if self.reject_updates.contains(&update.train_id) {
            return Err(FleetError::Status { status: 500, body: format!("cannot update {}", update.train_id) });
        }
        Ok(())
    }

    async fn current_model_assignment(&self) -> Result<Vec<Train>, FleetError> {
        if self.fail_assignment {
            return Err(FleetError::Status { status: 503, body: String::new() });
        }
        Ok(self.assignment.clone())
    }

    async fn reset_status(&self) -> Result<(), FleetError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset {
            return Err(FleetError::Transport("reset unreachable".into()));
        }
        Ok(())
    }

    async fn add_train(&self, body: &Value) -> Result<(), FleetError> {
        let mut added = self.added.lock().unwrap();
        let index = added.len();
        added.push(body.clone());
        if self.reject_add_at == Some(index) {
            return Err(FleetError::Status { status: 422, body: "train_id already exists".into() });
        }
        Ok(())
    }

    async fn submit_train(&self, submission: &TrainSubmission) -> Result<String, FleetError> {
        self.submissions.lock().unwrap().push(submission.clone());
        self.submit_reply.clone().ok_or(FleetError::UnexpectedResponse)
    }

    async fn stabling_geometry(&self) -> Result<StablingMap, FleetError> {
        self.stabling
            .clone()
            .ok_or_else(|| FleetError::Status { status: 500, body: "yard sensors offline".into() })
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

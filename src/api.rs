//! Backend REST contract and its HTTP implementation.
//!
//! DESIGN
//! ======
//! Flows depend on the `FleetApi` trait, never on reqwest directly, so tests
//! can substitute an in-memory backend. `HttpFleetApi` is the only production
//! implementation.
//!
//! ERROR HANDLING
//! ==============
//! A non-2xx status is always an error carrying the response text. Callers
//! decide whether that error is surfaced, logged, or ignored.

use reqwest::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::model::{StatusUpdate, Train, TrainSubmission};
use crate::stabling::StablingMap;

pub const GET_TRAINS_PATH: &str = "/api/get_trains";
pub const UPDATE_STATUS_PATH: &str = "/api/update_status";
pub const MODEL_ASSIGNMENT_PATH: &str = "/api/get_current_model_assignment";
pub const RESET_STATUS_PATH: &str = "/api/resetstatus";
pub const ADD_TRAIN_PATH: &str = "/api/addtrain";
pub const SUBMIT_TRAIN_PATH: &str = "/api/trains";
pub const STABLING_GEOMETRY_PATH: &str = "/api/get_stabling_geometry";

const STABLING_FALLBACK_ERROR: &str = "Failed to fetch stabling geometry";

// =============================================================================
// CONTRACT
// =============================================================================

/// Everything the client needs from the fleet backend.
#[async_trait::async_trait]
pub trait FleetApi: Send + Sync {
    /// `GET /api/get_trains`.
    async fn get_trains(&self) -> Result<Vec<Train>, FleetError>;

    /// `POST /api/update_status` with `{train_id, status}`.
    async fn update_status(&self, update: &StatusUpdate) -> Result<(), FleetError>;

    /// `GET /api/get_current_model_assignment`.
    async fn current_model_assignment(&self) -> Result<Vec<Train>, FleetError>;

    /// `GET /api/resetstatus`.
    async fn reset_status(&self) -> Result<(), FleetError>;

    /// `POST /api/addtrain`. The body is either a typed form payload or a
    /// coerced CSV row, so it travels as JSON.
    async fn add_train(&self, body: &Value) -> Result<(), FleetError>;

    /// `POST /api/trains`; returns the server's `message`.
    async fn submit_train(&self, submission: &TrainSubmission) -> Result<String, FleetError>;

    /// `GET /api/get_stabling_geometry`.
    async fn stabling_geometry(&self) -> Result<StablingMap, FleetError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpFleetApi {
    http: reqwest::Client,
    base_url: String,
    stabling_base_url: String,
}

impl HttpFleetApi {
    /// Build a client honouring the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::HttpClientBuild`] if reqwest cannot build a client.
    pub fn new(config: &FleetConfig) -> Result<Self, FleetError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| FleetError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            stabling_base_url: config.stabling_base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FleetError> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<Response, FleetError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, FleetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FleetError::Status { status: status.as_u16(), body })
}

#[async_trait::async_trait]
impl FleetApi for HttpFleetApi {
    async fn get_trains(&self) -> Result<Vec<Train>, FleetError> {
        self.get_json(GET_TRAINS_PATH).await
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), FleetError> {
        self.post_json(UPDATE_STATUS_PATH, update).await?;
        Ok(())
    }

    async fn current_model_assignment(&self) -> Result<Vec<Train>, FleetError> {
        self.get_json(MODEL_ASSIGNMENT_PATH).await
    }

    async fn reset_status(&self) -> Result<(), FleetError> {
        let response = self.http.get(self.url(RESET_STATUS_PATH)).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn add_train(&self, body: &Value) -> Result<(), FleetError> {
        self.post_json(ADD_TRAIN_PATH, body).await?;
        Ok(())
    }

    async fn submit_train(&self, submission: &TrainSubmission) -> Result<String, FleetError> {
        let response = self.post_json(SUBMIT_TRAIN_PATH, submission).await?;
        let body = response.json::<Value>().await?;
        body.get("message")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or(FleetError::UnexpectedResponse)
    }

    async fn stabling_geometry(&self) -> Result<StablingMap, FleetError> {
        let url = format!("{}{}", self.stabling_base_url, STABLING_GEOMETRY_PATH);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<StablingMap>().await?);
        }
        let text = response.text().await.unwrap_or_default();
        Err(FleetError::Status { status: status.as_u16(), body: stabling_error_message(&text) })
    }
}

/// The backend reports stabling failures as `{"error": "..."}`.
fn stabling_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(ToOwned::to_owned))
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| STABLING_FALLBACK_ERROR.to_owned())
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

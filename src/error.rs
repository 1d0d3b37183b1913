//! Error taxonomy for backend calls.
//!
//! DESIGN
//! ======
//! Every backend interaction funnels into `FleetError`. None of the flows
//! retry, so there is no retryable/fatal split here; the code string is what
//! callers log and match on.

/// Stable machine-readable code for an error value.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

/// Errors produced while talking to the fleet backend.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON we expected.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The response decoded but lacked a field the flow depends on.
    #[error("Unexpected response format")]
    UnexpectedResponse,
}

impl FleetError {
    /// Text to show the operator: the backend's own body when it sent one,
    /// otherwise the error display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => body.trim().to_owned(),
            other => other.to_string(),
        }
    }
}

impl ErrorCode for FleetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Status { .. } => "E_HTTP_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::UnexpectedResponse => "E_UNEXPECTED_RESPONSE",
        }
    }
}

impl From<reqwest::Error> for FleetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

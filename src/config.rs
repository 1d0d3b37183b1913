//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::FleetError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// Backend serving the roster, status and add-train endpoints.
    pub base_url: String,
    /// Backend serving stabling geometry. Deployments host it separately.
    pub stabling_base_url: String,
    pub timeouts: Timeouts,
}

impl FleetConfig {
    /// Config pointing both backends at `base_url` with default timeouts.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = normalize_url(base_url);
        Self { stabling_base_url: base_url.clone(), base_url, timeouts: Timeouts::default() }
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `FLEET_BASE_URL`: default `http://127.0.0.1:4001`
    /// - `FLEET_STABLING_BASE_URL`: defaults to `FLEET_BASE_URL`
    /// - `FLEET_REQUEST_TIMEOUT_SECS`: default 30
    /// - `FLEET_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Config`] when a URL lacks an http(s) scheme or a
    /// timeout is not a positive integer.
    pub fn from_env() -> Result<Self, FleetError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FleetConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`FleetConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FleetError> {
        let base_url = parse_url("FLEET_BASE_URL", lookup("FLEET_BASE_URL").as_deref())?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let stabling_base_url = parse_url("FLEET_STABLING_BASE_URL", lookup("FLEET_STABLING_BASE_URL").as_deref())?
            .unwrap_or_else(|| base_url.clone());
        let timeouts = Timeouts {
            request_secs: parse_secs(
                "FLEET_REQUEST_TIMEOUT_SECS",
                lookup("FLEET_REQUEST_TIMEOUT_SECS").as_deref(),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect_secs: parse_secs(
                "FLEET_CONNECT_TIMEOUT_SECS",
                lookup("FLEET_CONNECT_TIMEOUT_SECS").as_deref(),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };
        Ok(Self { base_url, stabling_base_url, timeouts })
    }
}

fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_url(key: &str, raw: Option<&str>) -> Result<Option<String>, FleetError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(FleetError::Config(format!("{key} must start with http:// or https://: {raw}")));
    }
    Ok(Some(normalize_url(raw)))
}

fn parse_secs(key: &str, raw: Option<&str>, default: u64) -> Result<u64, FleetError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(FleetError::Config(format!("{key} must be a positive integer: {raw}"))),
        Ok(secs) => Ok(secs),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

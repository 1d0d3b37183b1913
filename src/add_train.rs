//! Add-train form: client-side validation and submission.
//!
//! Validation runs before any request is built; a form that fails
//! validation never reaches the backend.

use std::str::FromStr;

use crate::api::FleetApi;
use crate::error::FleetError;
use crate::model::{NewTrain, TrainSubmission, parse_iso_date};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Train ID (integer) is required.")]
    MissingTrainId,
    #[error("Mileage this month is required.")]
    MissingMileage,
    #[error("Train ID must be a whole number.")]
    InvalidTrainId,
    #[error("Mileage this month must be a non-negative number.")]
    InvalidMileage,
    #[error("{field} must be a non-negative whole number.")]
    InvalidBrandingDays { field: &'static str },
    #[error("Branding expiry date must be in YYYY-MM-DD format.")]
    InvalidExpiryDate,
}

#[derive(Debug, thiserror::Error)]
pub enum AddTrainError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Backend(#[from] FleetError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitStatus {
    #[default]
    Fit,
    NeedMaintenance,
}

impl FromStr for FitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fit" => Ok(Self::Fit),
            "need_maintenance" => Ok(Self::NeedMaintenance),
            other => Err(format!("unknown fit status `{other}` (expected fit or need_maintenance)")),
        }
    }
}

/// Raw form fields as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTrainForm {
    train_id: String,
    pub fit_status: FitStatus,
    pub mileage_kms_this_month: String,
    pub has_branding: bool,
    pub branding_days_completed: String,
    pub branding_days_required: String,
    pub branding_expiry_date: String,
}

impl AddTrainForm {
    #[must_use]
    pub fn train_id(&self) -> &str {
        &self.train_id
    }

    /// Accept the input only if it is empty or all ASCII digits. Returns
    /// whether the field changed; rejected input leaves the old value.
    pub fn set_train_id(&mut self, input: &str) -> bool {
        if input.is_empty() || input.bytes().all(|b| b.is_ascii_digit()) {
            self.train_id = input.to_owned();
            return true;
        }
        false
    }

    /// Build the typed payload, or the first validation failure.
    ///
    /// # Errors
    ///
    /// Returns a [`FormError`] naming the first invalid field.
    pub fn validate(&self) -> Result<NewTrain, FormError> {
        let train_id = self.train_id.trim();
        if train_id.is_empty() {
            return Err(FormError::MissingTrainId);
        }
        let mileage = self.mileage_kms_this_month.trim();
        if mileage.is_empty() {
            return Err(FormError::MissingMileage);
        }

        let train_id = train_id.parse::<i64>().map_err(|_| FormError::InvalidTrainId)?;
        let mileage_kms_this_month = mileage
            .parse::<f64>()
            .ok()
            .filter(|m| m.is_finite() && *m >= 0.0)
            .ok_or(FormError::InvalidMileage)?;

        let (branding_days_completed, branding_days_required, branding_expiry_date) = if self.has_branding {
            let completed = parse_days(&self.branding_days_completed, "Branding days completed")?;
            let required = parse_days(&self.branding_days_required, "Branding days required")?;
            let expiry = self.branding_expiry_date.trim();
            let expiry = if expiry.is_empty() {
                None
            } else {
                parse_iso_date(expiry).ok_or(FormError::InvalidExpiryDate)?;
                Some(expiry.to_owned())
            };
            (completed, required, expiry)
        } else {
            (0, 0, None)
        };

        Ok(NewTrain {
            train_id,
            is_fit_for_service: self.fit_status == FitStatus::Fit,
            mileage_kms_this_month,
            has_branding: self.has_branding,
            branding_days_completed,
            branding_days_required,
            branding_expiry_date,
        })
    }

    /// Validate and post to `/api/addtrain`.
    ///
    /// # Errors
    ///
    /// [`AddTrainError::Form`] when validation fails (no request is sent),
    /// [`AddTrainError::Backend`] when the backend rejects the train.
    pub async fn submit(&self, api: &dyn FleetApi) -> Result<NewTrain, AddTrainError> {
        let payload = self.validate()?;
        let body = serde_json::to_value(&payload).map_err(|e| FleetError::Decode(e.to_string()))?;
        api.add_train(&body).await?;
        tracing::info!(train_id = payload.train_id, "train added");
        Ok(payload)
    }
}

fn parse_days(raw: &str, field: &'static str) -> Result<u32, FormError> {
    raw.trim().parse::<u32>().map_err(|_| FormError::InvalidBrandingDays { field })
}

/// Post the loosely typed submit-data form to `/api/trains` and return the
/// backend's confirmation message.
///
/// # Errors
///
/// Returns the backend error, or [`FleetError::UnexpectedResponse`] when the
/// reply has no `message`.
pub async fn submit_raw(api: &dyn FleetApi, submission: &TrainSubmission) -> Result<String, FleetError> {
    let message = api.submit_train(submission).await?;
    tracing::info!(train_id = %submission.train_id, "train data submitted");
    Ok(message)
}

#[cfg(test)]
#[path = "add_train_test.rs"]
mod tests;

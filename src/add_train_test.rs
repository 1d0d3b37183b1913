use super::*;
use crate::test_support::MockFleetApi;
use serde_json::json;

fn filled() -> AddTrainForm {
    let mut form = AddTrainForm { mileage_kms_this_month: "3700.5".into(), ..AddTrainForm::default() };
    assert!(form.set_train_id("17"));
    form
}

// =============================================================
// train id input
// =============================================================

#[test]
fn set_train_id_accepts_digits_and_empty() {
    let mut form = AddTrainForm::default();
    assert!(form.set_train_id("123"));
    assert_eq!(form.train_id(), "123");
    assert!(form.set_train_id(""));
    assert_eq!(form.train_id(), "");
}

#[test]
fn set_train_id_rejects_non_digits_and_keeps_value() {
    let mut form = AddTrainForm::default();
    form.set_train_id("12");
    assert!(!form.set_train_id("12a"));
    assert!(!form.set_train_id("-1"));
    assert!(!form.set_train_id("1.5"));
    assert_eq!(form.train_id(), "12");
}

// =============================================================
// validation
// =============================================================

#[test]
fn missing_train_id_checked_first() {
    let form = AddTrainForm::default();
    assert_eq!(form.validate(), Err(FormError::MissingTrainId));
    assert_eq!(FormError::MissingTrainId.to_string(), "Train ID (integer) is required.");
}

#[test]
fn missing_mileage() {
    let mut form = filled();
    form.mileage_kms_this_month = "  ".into();
    assert_eq!(form.validate(), Err(FormError::MissingMileage));
    assert_eq!(FormError::MissingMileage.to_string(), "Mileage this month is required.");
}

#[test]
fn negative_or_garbage_mileage_rejected() {
    let mut form = filled();
    form.mileage_kms_this_month = "-4".into();
    assert_eq!(form.validate(), Err(FormError::InvalidMileage));
    form.mileage_kms_this_month = "lots".into();
    assert_eq!(form.validate(), Err(FormError::InvalidMileage));
}

#[test]
fn oversized_train_id_rejected() {
    let mut form = filled();
    form.set_train_id("99999999999999999999");
    assert_eq!(form.validate(), Err(FormError::InvalidTrainId));
}

#[test]
fn unbranded_payload_zeroes_branding_fields() {
    let mut form = filled();
    form.branding_days_completed = "9".into();
    form.branding_expiry_date = "2025-01-01".into();
    let payload = form.validate().unwrap();
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({
            "train_id": 17,
            "is_fit_for_service": true,
            "mileage_kms_this_month": 3700.5,
            "has_branding": false,
            "branding_days_completed": 0,
            "branding_days_required": 0,
            "branding_expiry_date": null
        })
    );
}

#[test]
fn branded_payload_carries_days_and_expiry() {
    let mut form = filled();
    form.fit_status = FitStatus::NeedMaintenance;
    form.has_branding = true;
    form.branding_days_completed = "12".into();
    form.branding_days_required = "30".into();
    form.branding_expiry_date = "2025-06-30".into();
    let payload = form.validate().unwrap();
    assert!(!payload.is_fit_for_service);
    assert_eq!(payload.branding_days_completed, 12);
    assert_eq!(payload.branding_days_required, 30);
    assert_eq!(payload.branding_expiry_date.as_deref(), Some("2025-06-30"));
}

#[test]
fn branded_payload_requires_whole_days() {
    let mut form = filled();
    form.has_branding = true;
    form.branding_days_completed = "3".into();
    form.branding_days_required = "".into();
    assert_eq!(
        form.validate(),
        Err(FormError::InvalidBrandingDays { field: "Branding days required" })
    );
}

#[test]
fn branded_payload_rejects_bad_expiry() {
    let mut form = filled();
    form.has_branding = true;
    form.branding_days_completed = "1".into();
    form.branding_days_required = "2".into();
    form.branding_expiry_date = "30/06/2025".into();
    assert_eq!(form.validate(), Err(FormError::InvalidExpiryDate));
}

#[test]
fn fit_status_parses() {
    assert_eq!("fit".parse::<FitStatus>(), Ok(FitStatus::Fit));
    assert_eq!("need_maintenance".parse::<FitStatus>(), Ok(FitStatus::NeedMaintenance));
    assert!("broken".parse::<FitStatus>().is_err());
}

// =============================================================
// submission
// =============================================================

#[tokio::test]
async fn invalid_form_sends_nothing() {
    let api = MockFleetApi::default();
    let err = AddTrainForm::default().submit(&api).await.unwrap_err();
    assert!(matches!(err, AddTrainError::Form(FormError::MissingTrainId)));
    assert!(api.recorded_adds().is_empty());
}

#[tokio::test]
async fn valid_form_posts_payload() {
    let api = MockFleetApi::default();
    let payload = filled().submit(&api).await.unwrap();
    assert_eq!(payload.train_id, 17);
    let adds = api.recorded_adds();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0]["train_id"], json!(17));
}

#[tokio::test]
async fn backend_rejection_surfaces() {
    let api = MockFleetApi { reject_add_at: Some(0), ..MockFleetApi::default() };
    let err = filled().submit(&api).await.unwrap_err();
    assert!(matches!(err, AddTrainError::Backend(FleetError::Status { status: 422, .. })));
}

#[tokio::test]
async fn submit_raw_returns_message() {
    let api = MockFleetApi { submit_reply: Some("Train data saved".into()), ..MockFleetApi::default() };
    let submission = TrainSubmission {
        train_id: "KM-12".into(),
        model: "Metropolis".into(),
        is_fit_for_service: true,
        ..TrainSubmission::default()
    };
    assert_eq!(submit_raw(&api, &submission).await.unwrap(), "Train data saved");
    assert_eq!(api.submissions.lock().unwrap()[0].model, "Metropolis");
}

#[tokio::test]
async fn submit_raw_without_message_is_unexpected() {
    let api = MockFleetApi::default();
    let err = submit_raw(&api, &TrainSubmission::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "Unexpected response format");
}

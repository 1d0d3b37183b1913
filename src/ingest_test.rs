use super::*;
use crate::test_support::MockFleetApi;
use serde_json::json;

const HEADER: &str = "train_id,model,mileage_kms_this_month,is_fit_for_service,has_branding,branding_days_completed,branding_days_required,branding_expiry_date\n";

fn csv_of(rows: &[&str]) -> String {
    let mut doc = HEADER.to_owned();
    for row in rows {
        doc.push_str(row);
        doc.push('\n');
    }
    doc
}

// =============================================================
// coercion helpers
// =============================================================

#[test]
fn leading_int_is_lenient() {
    assert_eq!(parse_leading_int("5"), Some(5));
    assert_eq!(parse_leading_int("  42 "), Some(42));
    assert_eq!(parse_leading_int("12abc"), Some(12));
    assert_eq!(parse_leading_int("3.9"), Some(3));
    assert_eq!(parse_leading_int("-7"), Some(-7));
    assert_eq!(parse_leading_int(""), None);
    assert_eq!(parse_leading_int("abc"), None);
    assert_eq!(parse_leading_int("-"), None);
}

#[test]
fn leading_decimal_is_lenient() {
    assert_eq!(parse_leading_decimal("3700.5"), Some(3700.5));
    assert_eq!(parse_leading_decimal("3700.5 km"), Some(3700.5));
    assert_eq!(parse_leading_decimal(".5"), Some(0.5));
    assert_eq!(parse_leading_decimal("12."), Some(12.0));
    assert_eq!(parse_leading_decimal("1e3x"), Some(1000.0));
    assert_eq!(parse_leading_decimal("2e"), Some(2.0));
    assert_eq!(parse_leading_decimal("."), None);
    assert_eq!(parse_leading_decimal("n/a"), None);
}

#[test]
fn flag_accepts_true_one_yes_any_case() {
    for raw in ["true", "TRUE", "1", "Yes", " yes "] {
        assert!(parse_flag(raw), "{raw}");
    }
    for raw in ["false", "0", "no", "", "y", "on"] {
        assert!(!parse_flag(raw), "{raw}");
    }
}

// =============================================================
// parse_rows
// =============================================================

#[test]
fn row_types_are_coerced() {
    let rows = parse_rows(csv_of(&["5,Metropolis,1200.75,true,no,,30,2025-01-31"]).as_bytes()).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["train_id"], json!(5));
    assert_eq!(row["model"], json!("Metropolis"));
    assert_eq!(row["mileage_kms_this_month"], json!(1200.75));
    assert_eq!(row["is_fit_for_service"], json!(true));
    assert_eq!(row["has_branding"], json!(false));
    assert_eq!(row["branding_days_completed"], Value::Null);
    assert_eq!(row["branding_days_required"], json!(30));
    assert_eq!(row["branding_expiry_date"], json!("2025-01-31"));
}

#[test]
fn unknown_columns_pass_through() {
    let rows = parse_rows("train_id,depot\n8,Muttom\n".as_bytes()).unwrap();
    assert_eq!(rows[0]["train_id"], json!(8));
    assert_eq!(rows[0]["depot"], json!("Muttom"));
    assert!(rows[0].get("status").is_none());
}

#[test]
fn blank_lines_are_skipped() {
    let rows = parse_rows("train_id,has_branding\n1,yes\n\n2,0\n\n".as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["has_branding"], json!(false));
}

#[test]
fn header_only_yields_no_rows() {
    assert!(parse_rows(HEADER.as_bytes()).unwrap().is_empty());
}

#[test]
fn ragged_record_reports_file_row() {
    let doc = "train_id,has_branding\n1,yes\n2\n3,no\n";
    match parse_rows(doc.as_bytes()) {
        Err(IngestError::MalformedRow { row, message }) => {
            assert_eq!(row, 3);
            assert_eq!(message, "found record with 1 fields, but the header has 2 fields");
        }
        other => panic!("expected malformed row, got {other:?}"),
    }
}

// =============================================================
// upload
// =============================================================

#[tokio::test]
async fn upload_posts_every_row_in_order() {
    let api = MockFleetApi::default();
    let doc = csv_of(&["1,A,10,true,false,0,0,", "2,B,20,false,true,3,9,2025-02-01"]);
    let report = upload_csv(&api, doc.as_bytes()).await.unwrap();
    assert_eq!(report, UploadReport { uploaded: 2, failure: None });
    assert_eq!(report.message(), "Successfully uploaded 2 trains");
    let ids: Vec<Value> = api.recorded_adds().iter().map(|b| b["train_id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn upload_aborts_at_first_rejection() {
    let api = MockFleetApi { reject_add_at: Some(1), ..MockFleetApi::default() };
    let doc = csv_of(&["1,A,10,1,0,,,", "2,B,20,1,0,,,", "3,C,30,1,0,,,", "4,D,40,1,0,,,"]);
    let report = upload_csv(&api, doc.as_bytes()).await.unwrap();

    assert_eq!(report.uploaded, 1);
    assert_eq!(
        report.failure,
        Some(RowFailure { kind: FailureKind::Rejected, row: 3, message: "train_id already exists".into() })
    );
    assert_eq!(report.message(), "Error uploading train at row 3: train_id already exists");
    assert_eq!(api.recorded_adds().len(), 2, "rows after the rejected one are never sent");
}

#[tokio::test]
async fn malformed_record_stops_after_earlier_rows_are_sent() {
    let api = MockFleetApi::default();
    let doc = "train_id,has_branding\n5,yes\n   \n6,no\n";
    let report = upload_csv(&api, doc.as_bytes()).await.unwrap();

    assert_eq!(report.uploaded, 1);
    let failure = report.failure.clone().unwrap();
    assert_eq!(failure.kind, FailureKind::Malformed);
    assert_eq!(failure.row, 3);
    assert!(!failure.message.contains("line:"), "{}", failure.message);
    assert!(report.message().starts_with("Failed to parse CSV file: malformed record at row 3"));

    let sent = api.recorded_adds();
    assert_eq!(sent.len(), 1, "rows after the malformed record are never sent");
    assert_eq!(sent[0]["train_id"], json!(5));
    assert_eq!(sent[0]["has_branding"], json!(true));
}

#[tokio::test]
async fn unreadable_header_sends_nothing() {
    let api = MockFleetApi::default();
    let err = upload_csv(&api, &b"train_id,\xff\n1,2\n"[..]).await.unwrap_err();
    assert!(matches!(err, IngestError::Parse(_)));
    assert!(err.to_string().starts_with("Failed to parse CSV file"));
    assert!(api.recorded_adds().is_empty());
}

#[test]
fn empty_rejection_body_uses_fallback_text() {
    let message = send_error_message(&FleetError::Status { status: 500, body: String::new() });
    assert_eq!(message, SEND_FALLBACK_ERROR);
}

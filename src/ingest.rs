//! CSV bulk upload for the add-train flow.
//!
//! DESIGN
//! ======
//! Records are read, coerced and posted one at a time, in file order. The
//! first malformed record or backend rejection stops the batch; rows before
//! it have already been sent and stay sent.
//!
//! Coercion is deliberately lenient: numeric columns take the leading number
//! of the cell and become `null` when there is none, boolean columns accept
//! `true`/`1`/`yes` and treat everything else as false. Unknown columns pass
//! through as strings for the backend to judge.

use std::io::Read;

use serde_json::{Map, Number, Value};

use crate::api::FleetApi;
use crate::error::FleetError;

pub const INTEGER_COLUMNS: [&str; 3] = ["train_id", "branding_days_completed", "branding_days_required"];
pub const DECIMAL_COLUMNS: [&str; 1] = ["mileage_kms_this_month"];
pub const FLAG_COLUMNS: [&str; 2] = ["is_fit_for_service", "has_branding"];

const SEND_FALLBACK_ERROR: &str = "Failed to send train data";

/// One coerced CSV row, ready to post.
pub type TrainRow = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to parse CSV file: {0}")]
    Parse(String),
    #[error("Failed to parse CSV file: malformed record at row {row}: {message}")]
    MalformedRow { row: u64, message: String },
}

// =============================================================================
// PARSING
// =============================================================================

/// Streams coerced rows out of a headed CSV document. Blank lines are
/// skipped; a record whose field count differs from the header yields
/// [`IngestError::MalformedRow`] with its 1-based file row.
pub struct RowReader<R> {
    headers: csv::StringRecord,
    records: csv::StringRecordsIntoIter<R>,
    next_index: u64,
}

impl<R: Read> RowReader<R> {
    /// # Errors
    ///
    /// [`IngestError::Parse`] when the header cannot be read.
    pub fn new(input: R) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(false).from_reader(input);
        let headers = reader.headers().map_err(|e| IngestError::Parse(record_error_message(&e)))?.clone();
        Ok(Self { headers, records: reader.into_records(), next_index: 0 })
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<TrainRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(match record {
            Ok(record) => Ok(coerce_row(&self.headers, &record)),
            Err(e) => Err(IngestError::MalformedRow {
                row: e.position().map_or(index + 2, csv::Position::line),
                message: record_error_message(&e),
            }),
        })
    }
}

/// Read a whole headed CSV document into coerced rows.
///
/// # Errors
///
/// [`IngestError::Parse`] when the header cannot be read,
/// [`IngestError::MalformedRow`] for the first bad record.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<TrainRow>, IngestError> {
    RowReader::new(input)?.collect()
}

/// What went wrong with a record, without the csv crate's position prefix.
fn record_error_message(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("found record with {len} fields, but the header has {expected_len} fields")
        }
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {err}"),
        csv::ErrorKind::Io(err) => err.to_string(),
        _ => error.to_string(),
    }
}

/// Pair header names with cells and coerce typed columns.
#[must_use]
pub fn coerce_row(headers: &csv::StringRecord, record: &csv::StringRecord) -> TrainRow {
    headers
        .iter()
        .zip(record.iter())
        .map(|(column, cell)| (column.to_owned(), coerce_cell(column, cell)))
        .collect()
}

fn coerce_cell(column: &str, cell: &str) -> Value {
    if INTEGER_COLUMNS.contains(&column) {
        parse_leading_int(cell).map_or(Value::Null, Value::from)
    } else if DECIMAL_COLUMNS.contains(&column) {
        parse_leading_decimal(cell).and_then(Number::from_f64).map_or(Value::Null, Value::Number)
    } else if FLAG_COLUMNS.contains(&column) {
        Value::Bool(parse_flag(cell))
    } else {
        Value::String(cell.to_owned())
    }
}

/// Leading integer of `raw`: `"12abc"` is 12, `"3.9"` is 3, `"x1"` is `None`.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Leading decimal of `raw`: `"3700.5 km"` is 3700.5, `".5"` is 0.5.
#[must_use]
pub fn parse_leading_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(s.starts_with(['+', '-']));

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    s[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// `true`, `1` and `yes` (any case) are true; everything else is false.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

// =============================================================================
// UPLOAD
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The record could not be read as CSV.
    Malformed,
    /// The backend refused the row.
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowFailure {
    pub kind: FailureKind,
    /// 1-based file row, counting the header as row 1.
    pub row: u64,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failure: Option<RowFailure>,
}

impl UploadReport {
    #[must_use]
    pub fn message(&self) -> String {
        match &self.failure {
            None => format!("Successfully uploaded {} trains", self.uploaded),
            Some(RowFailure { kind: FailureKind::Rejected, row, message }) => {
                format!("Error uploading train at row {row}: {message}")
            }
            Some(RowFailure { kind: FailureKind::Malformed, row, message }) => format!(
                "Failed to parse CSV file: malformed record at row {row}: {message} ({} trains uploaded before it)",
                self.uploaded
            ),
        }
    }
}

/// Post already parsed rows sequentially, stopping at the first rejection.
pub async fn upload_rows(api: &dyn FleetApi, rows: &[TrainRow]) -> UploadReport {
    upload_stream(api, rows.iter().cloned().map(Ok)).await
}

/// Read `input` record by record and post each row as soon as it is read.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] when the header cannot be read; nothing is
/// sent in that case. A malformed record later in the file ends the batch
/// and is reported in the [`UploadReport`].
pub async fn upload_csv<R: Read>(api: &dyn FleetApi, input: R) -> Result<UploadReport, IngestError> {
    let rows = RowReader::new(input)?;
    Ok(upload_stream(api, rows).await)
}

async fn upload_stream(
    api: &dyn FleetApi,
    rows: impl Iterator<Item = Result<TrainRow, IngestError>>,
) -> UploadReport {
    let mut uploaded = 0;
    for (index, row) in rows.enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(IngestError::MalformedRow { row, message }) => {
                tracing::warn!(row, uploaded, "csv upload stopped at malformed record");
                let failure = RowFailure { kind: FailureKind::Malformed, row, message };
                return UploadReport { uploaded, failure: Some(failure) };
            }
            Err(IngestError::Parse(message)) => {
                let failure = RowFailure { kind: FailureKind::Malformed, row: index as u64 + 2, message };
                return UploadReport { uploaded, failure: Some(failure) };
            }
        };
        if let Err(e) = api.add_train(&Value::Object(row)).await {
            let failure =
                RowFailure { kind: FailureKind::Rejected, row: index as u64 + 2, message: send_error_message(&e) };
            tracing::warn!(row = failure.row, error = %e, "csv upload aborted");
            return UploadReport { uploaded, failure: Some(failure) };
        }
        uploaded += 1;
    }
    tracing::info!(uploaded, "csv upload complete");
    UploadReport { uploaded, failure: None }
}

fn send_error_message(error: &FleetError) -> String {
    match error {
        FleetError::Status { body, .. } if body.trim().is_empty() => SEND_FALLBACK_ERROR.to_owned(),
        other => other.user_message(),
    }
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;

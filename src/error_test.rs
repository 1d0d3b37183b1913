use super::*;

#[test]
fn status_error_displays_code() {
    let err = FleetError::Status { status: 503, body: String::new() };
    assert_eq!(err.to_string(), "HTTP error! status: 503");
    assert_eq!(err.error_code(), "E_HTTP_STATUS");
}

#[test]
fn user_message_prefers_backend_body() {
    let err = FleetError::Status { status: 400, body: "  duplicate train_id \n".into() };
    assert_eq!(err.user_message(), "duplicate train_id");
}

#[test]
fn user_message_falls_back_to_display() {
    let err = FleetError::Status { status: 500, body: "   ".into() };
    assert_eq!(err.user_message(), "HTTP error! status: 500");

    let err = FleetError::Transport("connection refused".into());
    assert_eq!(err.user_message(), "request failed: connection refused");
}

#[test]
fn error_codes_are_distinct() {
    let codes = [
        FleetError::Config(String::new()).error_code(),
        FleetError::HttpClientBuild(String::new()).error_code(),
        FleetError::Transport(String::new()).error_code(),
        FleetError::Status { status: 0, body: String::new() }.error_code(),
        FleetError::Decode(String::new()).error_code(),
        FleetError::UnexpectedResponse.error_code(),
    ];
    let unique: std::collections::HashSet<_> = codes.iter().collect();
    assert_eq!(unique.len(), codes.len());
}

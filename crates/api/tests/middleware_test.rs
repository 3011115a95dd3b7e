use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use gestipc_api::middleware::error_handling::AppError;
use gestipc_core::errors::GestError;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn status_of(err: GestError) -> StatusCode {
    AppError(err).into_response().status()
}

#[rstest]
#[case(GestError::NotFound("service".to_string()), StatusCode::NOT_FOUND)]
#[case(GestError::Validation("bad input".to_string()), StatusCode::BAD_REQUEST)]
#[case(GestError::NoOpenEntry, StatusCode::CONFLICT)]
#[case(GestError::NotAssigned, StatusCode::FORBIDDEN)]
#[case(GestError::Channel("sendMessage".to_string()), StatusCode::BAD_GATEWAY)]
#[case(
    GestError::Configuration("token".to_string()),
    StatusCode::SERVICE_UNAVAILABLE
)]
fn test_error_status_mapping(#[case] err: GestError, #[case] expected: StatusCode) {
    assert_eq!(status_of(err), expected);
}

#[test]
fn test_already_clocked_in_maps_to_conflict() {
    assert_eq!(
        status_of(GestError::AlreadyClockedIn(Utc::now())),
        StatusCode::CONFLICT
    );
}

#[test]
fn test_database_errors_are_internal() {
    assert_eq!(
        status_of(GestError::Database(eyre::eyre!("connection refused"))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_eyre_report_converts_via_from() {
    let err: AppError = eyre::eyre!("boom").into();
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

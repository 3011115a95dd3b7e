use chrono::{TimeZone, Utc};
use gestipc_core::errors::{GestError, GestResult};

#[test]
fn test_error_display() {
    let not_found = GestError::NotFound("Service not found".to_string());
    let validation = GestError::Validation("Invalid input".to_string());
    let clocked_in =
        GestError::AlreadyClockedIn(Utc.with_ymd_and_hms(2026, 1, 25, 14, 30, 0).unwrap());
    let channel = GestError::Channel("sendMessage failed".to_string());
    let database = GestError::Database(eyre::eyre!("connection refused"));

    assert_eq!(not_found.to_string(), "Resource not found: Service not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert!(clocked_in.to_string().contains("2026-01-25 14:30:00"));
    assert!(channel.to_string().contains("sendMessage failed"));
    assert!(database.to_string().contains("Database error:"));
}

#[test]
fn test_precondition_classification() {
    assert!(GestError::NoOpenEntry.is_precondition());
    assert!(GestError::NotAssigned.is_precondition());
    assert!(GestError::AlreadyClockedIn(Utc::now()).is_precondition());
    assert!(!GestError::NotFound("x".to_string()).is_precondition());
    assert!(!GestError::Channel("x".to_string()).is_precondition());
}

#[test]
fn test_eyre_conversion() {
    fn failing() -> GestResult<()> {
        Err(eyre::eyre!("boom"))?;
        Ok(())
    }

    let err = failing().unwrap_err();
    assert!(matches!(err, GestError::Database(_)));
}

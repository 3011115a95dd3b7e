use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An open time entry already exists since {0}")]
    AlreadyClockedIn(DateTime<Utc>),

    #[error("No open time entry")]
    NoOpenEntry,

    #[error("Volunteer is not assigned to this activity")]
    NotAssigned,

    #[error("Messaging channel error: {0}")]
    Channel(String),

    #[error("Configuration missing: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

pub type GestResult<T> = Result<T, GestError>;

impl GestError {
    /// Precondition violations are reported back to the volunteer who
    /// triggered them; everything else is an operational failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GestError::AlreadyClockedIn(_) | GestError::NoOpenEntry | GestError::NotAssigned
        )
    }
}

use thiserror::Error;

/// Error taxonomy for the schedule core. Validation failures are rejected
/// before any mutation; not-found is distinct from bad input; storage
/// failures carry the underlying sqlx error for logging.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ScheduleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScheduleError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ScheduleError::NotFound(message.into())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

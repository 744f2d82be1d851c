use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong talking to the chat backend.
///
/// Callers only ever show one thing for all of these (see
/// [`crate::session::APOLOGY`]); the variants exist for the logs.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(StatusCode),

    #[error("backend response was malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("backend request task failed: {0}")]
    Task(String),
}

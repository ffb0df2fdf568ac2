// zohosync/src/errors.rs
use thiserror::Error;

/// Failures that abort a whole record family.
///
/// A record without a business key is not an error: writers report it as
/// `Ok(false)` and the orchestrator counts it as skipped.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Zoho authentication failed: {0}")]
    Auth(String),

    #[error("Zoho fetch failed: {0}")]
    Fetch(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

//! Central error type shared across the SQLCourier crates.
//!
//! Collaborator failures (database, SMTP, watcher) are stringified at the
//! boundary where they occur, so downstream crates never grow a dependency
//! on a backend's error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourierError {
    /// Credentials file missing, unreadable, or malformed.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Schedule expression rejected at registration time. Named `source_id`
    /// because thiserror reserves a `source` field for the error chain.
    #[error("Invalid schedule for {source_id}: {reason}")]
    InvalidSchedule { source_id: String, reason: String },

    /// Task file contained no query body.
    #[error("Empty query body in {0}")]
    EmptyQuery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CourierError>;

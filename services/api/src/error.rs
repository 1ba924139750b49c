//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the mapping of core
//! errors onto HTTP rejections.

use crate::config::ConfigError;
use axum::http::StatusCode;
use habit_tracker_core::{PortError, TrackError, ValidationError};
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a failure inside the tracking workflow.
    #[error("Tracking Error: {0}")]
    Track(#[from] TrackError),

    /// Represents a failure to hash a password outside a request.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What handlers return on failure: a status and a plain-text message.
pub type Rejection = (StatusCode, String);

/// Maps a port failure onto a response, logging anything unexpected.
pub fn port_rejection(err: PortError, action: &str) -> Rejection {
    match err {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Habit not found".to_string()),
        PortError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authorized".to_string()),
        PortError::Unexpected(msg) => {
            error!("Failed to {}: {}", action, msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

pub fn validation_rejection(err: ValidationError) -> Rejection {
    (StatusCode::BAD_REQUEST, err.to_string())
}

pub fn track_rejection(err: TrackError, action: &str) -> Rejection {
    match err {
        TrackError::Port(e) => port_rejection(e, action),
        TrackError::AlreadyTracked(_) => (
            StatusCode::BAD_REQUEST,
            "Habit already tracked for this date".to_string(),
        ),
        other @ (TrackError::FutureDate { .. } | TrackError::InsufficientHistory { .. }) => {
            (StatusCode::BAD_REQUEST, other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_port_errors_hide_details() {
        let (status, body) = port_rejection(
            PortError::Unexpected("connection reset".to_string()),
            "list habits",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to list habits");
    }

    #[test]
    fn insufficient_history_is_a_bad_request() {
        let (status, body) = track_rejection(
            TrackError::InsufficientHistory { needed: 7, found: 3 },
            "load history",
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Not sufficient history"));
    }
}

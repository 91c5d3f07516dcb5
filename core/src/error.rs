//! Error types for the Agri-Wealth API client.
//!
//! # Design
//! The backend reports failures in several inconsistent body shapes. The
//! `decode` module folds them into one of the tagged variants below so
//! callers can branch on the kind of failure instead of on message text.
//! `Display` prints only the user-facing message, which is what the UI
//! shows verbatim.

use thiserror::Error;

use crate::session::StorageError;

pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please check your connection and try again.";
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";

/// Errors returned by the API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response arrived before the per-call timeout; the request was dropped.
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    /// The backend could not be reached (DNS, refused or reset connection, offline).
    #[error("{}", NETWORK_MESSAGE)]
    Network(String),

    /// 422 response.
    #[error("{message}")]
    Validation {
        code: Option<String>,
        message: String,
    },

    /// 401 response.
    #[error("{message}")]
    Auth { message: String },

    /// 409 response.
    #[error("{message}")]
    Conflict { message: String },

    /// Any other non-2xx response.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A success body could not be deserialized.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    /// The human-readable message for this error.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status the error was decoded from, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(422),
            ApiError::Auth { .. } => Some(401),
            ApiError::Conflict { .. } => Some(409),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_user_message() {
        let err = ApiError::Auth {
            message: "bad pw".to_string(),
        };
        assert_eq!(err.to_string(), "bad pw");
        assert_eq!(err.message(), "bad pw");
    }

    #[test]
    fn transport_errors_have_fixed_messages() {
        assert_eq!(ApiError::Timeout.message(), TIMEOUT_MESSAGE);
        assert_eq!(
            ApiError::Network("connection refused".to_string()).message(),
            NETWORK_MESSAGE
        );
    }

    #[test]
    fn status_is_known_only_for_server_answers() {
        assert_eq!(ApiError::Timeout.status(), None);
        assert_eq!(
            ApiError::Server {
                status: 503,
                message: "down".to_string()
            }
            .status(),
            Some(503)
        );
        assert_eq!(
            ApiError::Conflict {
                message: "dup".to_string()
            }
            .status(),
            Some(409)
        );
    }
}

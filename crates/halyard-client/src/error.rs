//! Client error types.

use halyard_session::SessionError;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// The request failed authorization even after a credential renewal.
    /// Terminal for this request only; the session may still be valid.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Credential renewal failed; the session has ended.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is an authorization error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this is a session-ending renewal failure.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Session(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response from the server.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_predicate() {
        assert!(Error::Auth("nope".into()).is_auth_error());
        assert!(Error::Api {
            status: 401,
            message: "unauthorized".into()
        }
        .is_auth_error());
        assert!(!Error::Config("x".into()).is_auth_error());
    }

    #[test]
    fn test_session_expired_predicate() {
        let err = Error::Session(SessionError::Renewal {
            status: 401,
            message: "expired".into(),
        });
        assert!(err.is_session_expired());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_server_error_predicate() {
        assert!(Error::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_server_error());
        assert!(!Error::Api {
            status: 404,
            message: "missing".into()
        }
        .is_server_error());
    }
}

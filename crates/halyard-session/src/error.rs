//! Error types for the session subsystem.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while managing the session credential.
///
/// The type is `Clone` so a single refresh failure can be delivered to every
/// caller waiting on the same refresh cycle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Network/transport error, including a renewal call that timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The renewal endpoint rejected the call.
    #[error("renewal rejected ({status}): {message}")]
    Renewal {
        /// HTTP status returned by the renewal endpoint.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// The credential store failed to read or write.
    #[error("credential store error: {0}")]
    Store(String),

    /// No credential is available (not logged in, or already logged out).
    #[error("not authenticated")]
    NotAuthenticated,

    /// A refresh cycle ended without delivering an outcome.
    #[error("refresh cycle interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        SessionError::Network(e.to_string())
    }
}

//! Error types for wsm-core.

use thiserror::Error;

/// Result type alias using wsm-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a request never reached the API.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Is the backend running?";

/// Core error types for workspace operations
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Network error. Is the backend running? ({0})")]
    Network(String),

    // Auth errors
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session expired. Sign in again.")]
    SessionExpired,

    // API errors (non-2xx with an optional structured body)
    #[error("{message}")]
    Api { status: u16, message: String },

    // Workspace errors
    #[error("No active organization. Create or select one first.")]
    NoActiveOrganisation,

    #[error("Unknown organization: {0}")]
    UnknownOrganisation(String),

    #[error("State lock poisoned")]
    LockPoisoned,

    // Storage errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the request never completed.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::LockPoisoned
    }
}

//! Error types for the Stockroom client

use crate::session::SessionError;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Why an authorization failure could not be recovered in this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalReason {
    /// The request was already resubmitted once and failed authorization again
    RetryExhausted,
    /// The refresh endpoint itself answered with an authorization failure
    RefreshEndpointRejected,
    /// The refresh call failed (network error, non-success status, `success: false`)
    RefreshFailed(String),
    /// Too many refreshes in the configured window
    RefreshBudgetExceeded,
    /// The session was cleared (logout, another terminal failure) while the request was in flight
    SessionEnded,
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RetryExhausted => write!(f, "request was rejected again after a token refresh"),
            Self::RefreshEndpointRejected => write!(f, "refresh endpoint rejected the session"),
            Self::RefreshFailed(reason) => write!(f, "token refresh failed: {}", reason),
            Self::RefreshBudgetExceeded => write!(f, "too many token refreshes"),
            Self::SessionEnded => write!(f, "session ended while the request was in flight"),
        }
    }
}

/// Main error type for the Stockroom client
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status that is not an auth failure
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authorization failed and cannot be recovered without logging in again
    #[error("Session expired: {reason}")]
    AuthExpired { reason: TerminalReason },

    /// Login or signup answered `success: false`
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Session storage failure
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a new API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a terminal auth failure
    pub fn auth_expired(reason: TerminalReason) -> Self {
        Self::AuthExpired { reason }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether this error means the user has to log in again
    pub fn is_terminal_auth(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }

    /// Terminal reason, if this is a terminal auth failure
    pub fn terminal_reason(&self) -> Option<&TerminalReason> {
        match self {
            Self::AuthExpired { reason } => Some(reason),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short message suitable for showing to a user
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the server. Check your connection.".to_string(),
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::Api { status, .. } => format!("Request failed with status {}", status),
            Self::AuthExpired { .. } => "Your session has expired. Please log in again.".to_string(),
            Self::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

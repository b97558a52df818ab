//! Error types for ollamapipe
//!
//! Every transport failure is translated into one of these variants before it
//! reaches the caller; no raw `reqwest::Error` crosses the public API.

use thiserror::Error;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Request exceeded its configured deadline
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// Server could not be reached or the connection dropped
    #[error("Connection error: {message}")]
    ConnectionFailed { message: String },

    /// Non-success status, or an unclassified transport failure
    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },

    /// Malformed line protocol content or an empty generation
    #[error("Invalid response from API: {message}")]
    InvalidResponse { message: String },

    /// Caller-supplied generation parameter rejected
    #[error("Invalid parameter '{field}': {message}")]
    Validation { field: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    pub fn request<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::RequestFailed {
            message: message.into(),
            status_code,
        }
    }

    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether a higher level may reasonably retry (or switch endpoints)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailed { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        // A connect timeout reports both flags; it is a connection failure
        if err.is_connect() {
            ClientError::connection(err.to_string())
        } else if err.is_timeout() {
            ClientError::timeout(err.to_string())
        } else {
            let status = err.status().map(|s| s.as_u16());
            ClientError::request(err.to_string(), status)
        }
    }
}

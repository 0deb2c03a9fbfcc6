//! Error types for Grouper WS operations.
//!
//! Every failure surfaced by the client falls into one of four kinds: bad input
//! caught before a request is issued, a network-level failure, an error reported
//! by the service (HTTP status or result code), or an undecodable response.

use thiserror::Error;

/// Main error type for Grouper WS operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network failure (DNS, connection refused, timeout)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// HTTP error status or a failing Grouper result code
    #[error("Service error: {message}")]
    ServiceError {
        /// HTTP status code, when the failure was an HTTP error status
        status: Option<u16>,
        /// Grouper result code, when the service answered with a failing code
        result_code: Option<String>,
        /// Error message
        message: String,
    },

    /// Response body was not valid JSON or not the expected envelope
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Specialized result type for Grouper WS operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a [`Error::ServiceError`] for an HTTP error status.
    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::ServiceError {
            status: Some(status),
            result_code: None,
            message: message.into(),
        }
    }

    /// Builds a [`Error::ServiceError`] for an unexpected Grouper result code.
    #[must_use]
    pub fn unexpected_result(operation: &str, result_code: impl Into<String>) -> Self {
        let result_code = result_code.into();
        Self::ServiceError {
            status: None,
            message: format!("{operation} - Unexpected result received: {result_code}"),
            result_code: Some(result_code),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::ServiceError { .. } => "SERVICE_ERROR",
            Self::DecodeError(_) => "DECODE_ERROR",
        }
    }

    /// Returns the Grouper result code carried by a service error, if any.
    #[must_use]
    pub fn result_code(&self) -> Option<&str> {
        match self {
            Self::ServiceError { result_code, .. } => result_code.as_deref(),
            _ => None,
        }
    }

    /// Returns the HTTP status carried by a service error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceError { status, .. } => *status,
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportError(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::TransportError(format!("connection failed: {err}"))
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ValidationError(format!("invalid service URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

//! Error types for the billing SDK

use thiserror::Error;

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingErrorCode {
    /// Missing or invalid construction argument
    ConfigError,
    /// Transport-level failure (connection, TLS, malformed response body)
    NetworkError,
    /// Non-success HTTP response (fallback when the status has no closer code)
    RequestFailed,
    /// 401/403 response
    Unauthorized,
    /// 404 response
    NotFound,
    /// 5xx response
    ServerError,
    /// Unexpected internal failure (e.g. the fetch task was aborted)
    InternalError,
}

/// Error returned by all fallible SDK operations.
///
/// Carries a code for programmatic handling, a human-readable message, and the
/// HTTP status when the error originated from a response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BillingError {
    /// Machine-readable error code
    pub code: BillingErrorCode,
    /// Human-readable message
    pub message: String,
    /// HTTP status, if the error came from a response
    pub status: Option<u16>,
}

impl BillingError {
    pub fn new(code: BillingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    /// Configuration error (raised synchronously at construction time)
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::ConfigError, message)
    }

    /// Transport-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::NetworkError, message)
    }

    /// Internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::InternalError, message)
    }

    /// Failure derived from a non-success HTTP response
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: map_status_to_error_code(status),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Whether this error came from a non-success response (as opposed to a
    /// transport or configuration failure)
    pub fn is_response_error(&self) -> bool {
        self.status.is_some()
    }
}

/// Map an HTTP status to the closest error code
pub fn map_status_to_error_code(status: u16) -> BillingErrorCode {
    match status {
        401 | 403 => BillingErrorCode::Unauthorized,
        404 => BillingErrorCode::NotFound,
        500..=599 => BillingErrorCode::ServerError,
        _ => BillingErrorCode::RequestFailed,
    }
}

/// Result alias used throughout the SDK
pub type Result<T> = std::result::Result<T, BillingError>;

//! Shared Error Types
//!
//! This module defines the error types used across the client core.
//! `ApiError` is the single failure value produced at the HTTP-client
//! boundary; nothing else in the crate constructs one ad hoc.
//!
//! # Error Categories
//!
//! - `Network` - no response was ever received (transport failure, timeout)
//! - `Auth` - 401 / expired or invalid token
//! - `Validation` - 4xx application errors that must surface to the user
//! - `Server` - 5xx responses
//! - `Unknown` - anything not classified; treated conservatively as surfaced
//!
//! # Usage
//!
//! ```rust
//! use liftlog::shared::error::ApiError;
//!
//! // Wrap a transport failure
//! let error = ApiError::network("Network request failed");
//! assert!(error.http_status.is_none());
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across task
//! boundaries.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy for API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCause {
    /// Transport-level failure; no response was received
    Network,
    /// Authentication failure (401, expired/invalid token)
    Auth,
    /// Application-level validation failure (4xx other than 401)
    Validation,
    /// Server-side failure (5xx)
    Server,
    /// Unclassified failure
    Unknown,
}

/// Typed error produced at the HTTP-client/classifier boundary.
///
/// Invariant: `cause == Network` implies `http_status == None` - a network
/// error means no response was ever received. The `network` constructor is
/// the only way to produce that cause.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable error message
    pub message: String,
    /// HTTP status of the response, when one was received
    pub http_status: Option<u16>,
    /// Machine-readable error code from the response body
    pub error_code: Option<String>,
    /// Failure category
    pub cause: ErrorCause,
}

impl ApiError {
    /// Create a network error. No response was received, so there is no
    /// status and no server-provided error code.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            error_code: None,
            cause: ErrorCause::Network,
        }
    }

    /// Create an error from a non-2xx response.
    ///
    /// The cause is derived from the HTTP status: 401 is an auth failure,
    /// other 4xx are validation failures, 5xx are server failures.
    pub fn from_response(
        status: u16,
        detail: Option<String>,
        error_code: Option<String>,
    ) -> Self {
        let cause = match status {
            401 => ErrorCause::Auth,
            400..=499 => ErrorCause::Validation,
            500..=599 => ErrorCause::Server,
            _ => ErrorCause::Unknown,
        };

        Self {
            message: detail.unwrap_or_else(|| format!("Request failed with status {status}")),
            http_status: Some(status),
            error_code,
            cause,
        }
    }

    /// Create an authentication error that did not come from a response,
    /// e.g. a missing token on a non-public endpoint.
    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            error_code: Some("NOT_AUTHENTICATED".into()),
            cause: ErrorCause::Auth,
        }
    }

    /// Create an unclassified error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            error_code: None,
            cause: ErrorCause::Unknown,
        }
    }

    /// Whether this error represents an authentication failure.
    pub fn is_auth(&self) -> bool {
        self.cause == ErrorCause::Auth || self.http_status == Some(401)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timed out: {err}"))
        } else if err.is_connect() || err.is_request() {
            Self::network(format!("Network request failed: {err}"))
        } else if err.is_decode() {
            Self::unknown(format!("Failed to parse response: {err}"))
        } else {
            Self::network(format!("Network error: {err}"))
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::unknown(format!("JSON error: {err}"))
    }
}

/// User-visible store failure: a titled alert with an actionable message.
///
/// Stores produce these for failures that must surface to the user;
/// network-classified failures never become a `StoreError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{title}: {message}")]
pub struct StoreError {
    /// Alert title, e.g. "Error Creating Workout"
    pub title: String,
    /// Actionable message for the user
    pub message: String,
}

impl StoreError {
    /// Create a new store error.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Build from an API error, keeping the server-provided message.
    pub fn from_api(title: impl Into<String>, err: &ApiError) -> Self {
        Self {
            title: title.into(),
            message: format!("{}. Please try again.", err.message.trim_end_matches('.')),
        }
    }
}

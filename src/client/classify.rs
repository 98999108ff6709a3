//! # Error Classifier
//!
//! Decides whether a failure is a transient network problem, an
//! authentication problem, or a real application error. This is the
//! single decision point the rest of the crate uses to choose between
//! "suppress and retry silently" and "show the user an error" - call
//! sites must route through it rather than re-matching strings locally.
//!
//! The network signatures are encoded as data so the list is extensible
//! and independently testable.

use crate::shared::error::{ApiError, ErrorCause};

/// Message fragments that indicate a transport-level failure.
/// Matched case-insensitively against the error message.
const NETWORK_SIGNATURES: &[&str] = &[
    "failed to fetch",
    "network error",
    "network request failed",
    "aborterror",
    "timed out",
    "timeout",
    "connection refused",
    "connection reset",
    "dns error",
];

/// Error code the backend (and this client) use for transport failures.
const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Error codes that indicate an invalid or expired token.
const AUTH_ERROR_CODES: &[&str] = &["TOKEN_EXPIRED", "INVALID_TOKEN", "NOT_AUTHENTICATED"];

/// Classification verdict for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// Transient connectivity failure: suppress from the user, retry
    /// opportunistically
    pub is_network: bool,
    /// Authentication failure: refresh the token, then sign out
    pub is_auth: bool,
}

/// Classify an error. `None` (no error value at all) classifies as
/// neither network nor auth: an absent error must never be suppressed
/// as transient.
pub fn classify(error: Option<&ApiError>) -> Classification {
    let Some(error) = error else {
        return Classification::default();
    };

    let is_network = error.cause == ErrorCause::Network
        || error.error_code.as_deref() == Some(NETWORK_ERROR_CODE)
        || (error.http_status.is_none() && matches_network_signature(&error.message));

    let is_auth = error.http_status == Some(401)
        || error.cause == ErrorCause::Auth
        || error
            .error_code
            .as_deref()
            .is_some_and(|code| AUTH_ERROR_CODES.contains(&code));

    Classification { is_network, is_auth }
}

/// UI-facing helper: is this error a network failure?
pub fn is_network_error(error: &ApiError) -> bool {
    classify(Some(error)).is_network
}

fn matches_network_signature(message: &str) -> bool {
    let lowered = message.to_lowercase();
    NETWORK_SIGNATURES.iter().any(|sig| lowered.contains(sig))
}

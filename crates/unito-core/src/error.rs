// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Unito portal client.

use std::time::Duration;

use thiserror::Error;

/// Fallback message used when a failed response carries neither `detail`
/// nor `message`.
pub const GENERIC_API_FAILURE: &str = "API request failed";

/// The primary error type surfaced by the gateway and the state machines.
///
/// The first four variants are the caller-facing taxonomy: every one of them
/// reaches the calling layer as a rejected operation with a readable message.
#[derive(Debug, Error)]
pub enum UnitoError {
    /// Rejected locally because the portal is locked and the request is not
    /// on the lockdown allow-list. No network call was made.
    #[error("Your account is suspended. Please upgrade or update payment to continue.")]
    Entitlement { method: String, endpoint: String },

    /// A 401 could not be recovered by refreshing the credentials. The
    /// credential store has been cleared and the user must log in again.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// Any non-success, non-recovered response from the backend.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport-level failure; no response was received.
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request did not complete within the configured client timeout.
    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// A success response whose body could not be decoded into the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A local lifecycle transition was not permitted.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Configuration errors (invalid values, unusable base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable credential storage failures.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UnitoError {
    /// HTTP status of an [`UnitoError::Api`] failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error ended the current session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// A contract or subscription lifecycle step that the current state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a contract in status `{from}`")]
    NotAllowed { action: &'static str, from: String },

    #[error("notice period still running until {ends}")]
    NoticePeriodRunning { ends: chrono::NaiveDate },

    #[error("contract has no service end date")]
    MissingServiceEnd,

    #[error("service end date overflows the calendar")]
    DateOverflow,
}

/// Extract the human-readable message from an error response body.
///
/// Looks at `detail`, then `message`, then falls back to
/// [`GENERIC_API_FAILURE`]. Non-JSON bodies also fall back.
pub fn server_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return GENERIC_API_FAILURE.to_string();
    };
    ["detail", "message"]
        .iter()
        .find_map(|key| {
            value
                .get(*key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_API_FAILURE.to_string())
}

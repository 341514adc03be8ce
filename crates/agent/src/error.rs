//! Agent error type.

#![allow(missing_docs)]

use thiserror::Error;

/// Statuses after which a request must not be retried against an instance.
///
/// Not every permanent failure status, only those the Sofie core service
/// message API can reasonably be expected to return.
pub const DO_NOT_RETRY_STATUSES: [u16; 3] = [400, 404, 405];

/// Error type for remote instance operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Service message has no id")]
    MissingMessageId,

    /// The instance rejected the request with a do-not-retry status.
    #[error("Request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected response HTTP {status} {body}, wanted one of {expected}")]
    UnexpectedStatus {
        status: u16,
        body: String,
        expected: String,
    },

    /// The instance answered with something other than the expected JSON,
    /// typically a frontpage served by an instance without the API.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl AgentError {
    /// Build the error for a status outside the accepted set.
    #[must_use]
    pub fn from_status(status: u16, body: String, accepted: &[u16]) -> Self {
        if DO_NOT_RETRY_STATUSES.contains(&status) {
            Self::Rejected { status, body }
        } else {
            let expected = accepted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            Self::UnexpectedStatus {
                status,
                body,
                expected,
            }
        }
    }

    /// HTTP status returned by the instance, if one was received.
    #[must_use]
    pub const fn response_status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(_)
            | Self::InvalidUrl(_)
            | Self::MissingMessageId
            | Self::MalformedBody(_) => None,
        }
    }

    /// Whether retrying the same request can never succeed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

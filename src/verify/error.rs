//! Verification error definitions.

use thiserror::Error;

use crate::pool::TransportError;
use crate::resilience::timeouts::TimeoutKind;

/// Errors that can occur during a verification call.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Pool, connection or HTTP failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response body is not a JSON object.
    #[error("malformed verification response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Request could not be assembled.
    #[error("failed to build verification request: {0}")]
    Request(#[from] hyper::http::Error),
}

impl VerifyError {
    /// The timeout class, if this error is one of the fail-open timeouts.
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self {
            VerifyError::Transport(e) => e.timeout_kind(),
            _ => None,
        }
    }
}

impl From<hyper::Error> for VerifyError {
    fn from(e: hyper::Error) -> Self {
        VerifyError::Transport(TransportError::Http(e))
    }
}

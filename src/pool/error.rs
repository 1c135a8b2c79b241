//! Transport error definitions.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::timeouts::TimeoutKind;

/// Errors that can occur while leasing a connection or exchanging HTTP.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No pooled connection was assigned in time.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    LeaseTimeout(Duration),

    /// TCP, TLS or HTTP handshake did not finish in time.
    #[error("timed out after {0:?} establishing a connection")]
    ConnectTimeout(Duration),

    /// Response data did not arrive in time.
    #[error("timed out after {0:?} waiting for response data")]
    ReadTimeout(Duration),

    /// Connection refused, DNS failure, TLS failure.
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// HTTP protocol failure on an established connection.
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// The lease no longer holds a connection.
    #[error("leased connection is unavailable")]
    ConnectionUnavailable,

    /// Endpoint URL cannot be routed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Response body larger than the accepted maximum.
    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

impl TransportError {
    /// The timeout class, if this error is a timeout.
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self {
            TransportError::LeaseTimeout(_) => Some(TimeoutKind::Lease),
            TransportError::ConnectTimeout(_) => Some(TimeoutKind::Connect),
            TransportError::ReadTimeout(_) => Some(TimeoutKind::Read),
            _ => None,
        }
    }
}

//! Timeout enforcement.
//!
//! # Responsibilities
//! - Turn configured millisecond limits into optional deadlines
//! - Wrap pool, connect and read phases with Tokio's timeout
//! - Name the phase that timed out

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Phase of a pooled HTTP call that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// Waiting for the pool to assign a connection.
    Lease,
    /// Establishing TCP, TLS and the HTTP handshake.
    Connect,
    /// Waiting for response data.
    Read,
}

impl TimeoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutKind::Lease => "connection_pool",
            TimeoutKind::Connect => "connect",
            TimeoutKind::Read => "socket",
        }
    }
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero limit means the phase is unbounded.
pub fn limit_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Await `fut`, bounded by `limit` when one is set.
pub async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, Elapsed> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}

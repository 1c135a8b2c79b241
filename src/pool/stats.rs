//! Pool occupancy snapshot.

use std::fmt;

/// Point-in-time pool occupancy.
///
/// Best-effort: concurrent leases and releases are not ordered with the read,
/// but the counters are read together so `leased + available <= max` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Total connection cap.
    pub max: usize,
    /// Per-route connection cap.
    pub default_max_per_route: usize,
    /// Idle connections ready for reuse.
    pub available: usize,
    /// Connections currently assigned to callers.
    pub leased: usize,
    /// Callers waiting for a connection.
    pub pending: usize,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maxConnections: {}, defaultMaxPerRoute: {}, availableConnections: {}, leasedConnections: {}, pendingConnections: {}",
            self.max, self.default_max_per_route, self.available, self.leased, self.pending
        )
    }
}

//! Connection pooling subsystem.
//!
//! # Data Flow
//! ```text
//! VerificationClient needs a connection for a route
//!     → manager.rs (wait for route + total capacity, counted as pending)
//!     → reuse an idle open connection for the route, or
//!     → connector.rs (TCP, TLS for https) + HTTP/1.1 handshake
//!     → Lease handed to the caller
//!     → Lease released after a fully read response → idle set
//!       Lease dropped on any other path           → connection discarded
//! ```
//!
//! # Design Decisions
//! - Total cap and per-route cap are both `maxHttpConnections`
//! - No pre-warming; connections are opened lazily and reused
//! - Stats are counters read under a short lock, never waiting on I/O
//! - A drained pool keeps serving in-flight callers but pools nothing

pub mod connector;
pub mod error;
pub mod manager;
pub mod stats;

pub use connector::{BoxedIo, Connect, Route, Scheme, TlsConnector};
pub use error::TransportError;
pub use manager::{ConnectionPool, Lease};
pub use stats::PoolStats;

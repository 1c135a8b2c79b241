//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (pool gauges, verification counters)
//!
//! reporter.rs:
//!     ticker every `httpStatsInterval` seconds
//!     → ConnectionPool::stats()
//!     → info log line + gauges
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event; JSON output optional
//! - Metrics go through the `metrics` facade; exporting is the binary's choice
//! - The reporter is a Tokio task with a cancellation token, one per pool

#[cfg(test)]
pub(crate) mod capture;
pub mod logging;
pub mod metrics;
pub mod reporter;

pub use reporter::StatsReporter;

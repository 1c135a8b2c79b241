//! Metrics collection and exposition.
//!
//! # Metrics
//! - `recaptcha_pool_max` (gauge): total connection cap
//! - `recaptcha_pool_available` (gauge): idle connections
//! - `recaptcha_pool_leased` (gauge): connections assigned to callers
//! - `recaptcha_pool_pending` (gauge): callers waiting for a connection
//! - `recaptcha_verifications_total` (counter): attempts by `outcome`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::pool::PoolStats;
use crate::verify::Outcome;

/// Serve Prometheus metrics on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_pool_stats(stats: &PoolStats) {
    metrics::gauge!("recaptcha_pool_max").set(stats.max as f64);
    metrics::gauge!("recaptcha_pool_available").set(stats.available as f64);
    metrics::gauge!("recaptcha_pool_leased").set(stats.leased as f64);
    metrics::gauge!("recaptcha_pool_pending").set(stats.pending as f64);
}

pub fn record_verification(outcome: Outcome) {
    metrics::counter!("recaptcha_verifications_total", "outcome" => outcome.as_str()).increment(1);
}

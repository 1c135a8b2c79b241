//! Periodic pool stats reporting.
//!
//! # Responsibilities
//! - Log a pool snapshot immediately, then every interval
//! - Stop promptly on cancellation without waiting for a firing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::pool::ConnectionPool;

/// Handle to a scheduled stats task. Dropping it cancels the task.
#[derive(Debug)]
pub struct StatsReporter {
    cancel: CancellationToken,
    firings: Arc<AtomicU64>,
    scheduled: bool,
}

impl StatsReporter {
    /// A reporter with no task behind it.
    pub fn disabled() -> Self {
        Self {
            cancel: CancellationToken::new(),
            firings: Arc::new(AtomicU64::new(0)),
            scheduled: false,
        }
    }

    /// Report `pool` stats every `interval_secs` seconds on `runtime`.
    ///
    /// An interval of 0 disables reporting.
    pub fn schedule(pool: ConnectionPool, interval_secs: u64, runtime: &Handle) -> Self {
        if interval_secs == 0 {
            tracing::info!("HTTP pool stats reporting disabled");
            return Self::disabled();
        }

        let reporter = Self {
            cancel: CancellationToken::new(),
            firings: Arc::new(AtomicU64::new(0)),
            scheduled: true,
        };
        let cancel = reporter.cancel.clone();
        let firings = Arc::clone(&reporter.firings);
        let period = Duration::from_secs(interval_secs);

        runtime.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("HTTP pool stats reporter cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        report(&pool);
                        firings.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        tracing::info!(interval_secs, "HTTP pool stats reporter scheduled");
        reporter
    }

    /// Stop future firings. Idempotent and non-blocking.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token observers can await to learn when reporting stops.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Reports logged so far.
    pub fn firings(&self) -> u64 {
        self.firings.load(Ordering::Relaxed)
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn report(pool: &ConnectionPool) {
    let stats = pool.stats();
    tracing::info!(
        max = stats.max,
        default_max_per_route = stats.default_max_per_route,
        available = stats.available,
        leased = stats.leased,
        pending = stats.pending,
        "HTTP pool stats: {stats}"
    );
    metrics::record_pool_stats(&stats);
}

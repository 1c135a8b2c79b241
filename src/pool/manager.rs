//! Bounded pool of reusable HTTP/1.1 connections.
//!
//! # Responsibilities
//! - Enforce total and per-route connection caps
//! - Bound lease waits and connection establishment with deadlines
//! - Track idle, leased and waiting counts for stats

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;
use crate::pool::connector::{Connect, Route, TlsConnector};
use crate::pool::error::TransportError;
use crate::pool::stats::PoolStats;
use crate::resilience::timeouts::within;

/// Request body type carried by pooled connections.
pub type RequestBody = String;

type Sender = SendRequest<RequestBody>;

/// Per-route permit first, then total.
type Permits = (OwnedSemaphorePermit, OwnedSemaphorePermit);

/// A pool of keep-alive connections shared by all verification calls.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: PoolConfig,
    connector: Arc<dyn Connect>,
    total: Arc<Semaphore>,
    routes: DashMap<Route, Arc<Semaphore>>,
    state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
    idle: HashMap<Route, Vec<Sender>>,
    available: usize,
    leased: usize,
    pending: usize,
    drained: bool,
}

impl ConnectionPool {
    /// Create a pool that connects over TCP, with TLS for `https` routes.
    pub fn new(config: &PoolConfig) -> Self {
        Self::with_connector(config, Arc::new(TlsConnector::new()))
    }

    /// Create a pool over a custom transport.
    pub fn with_connector(config: &PoolConfig, connector: Arc<dyn Connect>) -> Self {
        tracing::info!(
            max_connections = config.max_connections,
            connection_request_timeout_ms = config.connection_request_timeout_ms,
            connect_timeout_ms = config.connect_timeout_ms,
            socket_timeout_ms = config.socket_timeout_ms,
            "Initializing HTTP connection pool"
        );

        Self {
            inner: Arc::new(PoolInner {
                config: *config,
                connector,
                total: Arc::new(Semaphore::new(config.max_connections)),
                routes: DashMap::new(),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Lease a connection to `route`, reusing an idle one when possible.
    ///
    /// Waiting for capacity is bounded by `apiConnectionRequestTimeout`,
    /// opening a new connection by `apiConnectTimeout`.
    pub async fn lease(&self, route: &Route) -> Result<Lease, TransportError> {
        let config = &self.inner.config;

        let permits = {
            let _waiting = Waiting::register(&self.inner);
            let lease_limit = config.connection_request_timeout();
            within(lease_limit, self.inner.acquire(route))
                .await
                .map_err(|_| TransportError::LeaseTimeout(lease_limit.unwrap_or_default()))??
        };

        let reused = self.inner.checkout_idle(route);
        let mut lease = Lease {
            pool: Arc::clone(&self.inner),
            route: route.clone(),
            reused: reused.is_some(),
            sender: reused,
            reusable: false,
            _permits: permits,
        };

        if lease.sender.is_none() {
            let connect_limit = config.connect_timeout();
            let sender = within(connect_limit, self.inner.connect(route))
                .await
                .map_err(|_| TransportError::ConnectTimeout(connect_limit.unwrap_or_default()))??;
            lease.sender = Some(sender);
        }

        tracing::trace!(route = %route, reused = lease.reused, "Connection leased");
        Ok(lease)
    }

    /// Current occupancy. Reads counters only; never waits on connections.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock_state();
        PoolStats {
            max: self.inner.config.max_connections,
            default_max_per_route: self.inner.config.max_connections,
            available: state.available,
            leased: state.leased,
            pending: state.pending,
        }
    }

    /// Release idle connections and stop pooling returned ones.
    ///
    /// In-flight leases complete normally; their connections are closed on
    /// release instead of being kept.
    pub fn drain(&self) {
        let mut state = self.inner.lock_state();
        state.drained = true;
        state.idle.clear();
        state.available = 0;
        tracing::debug!(leased = state.leased, "HTTP connection pool drained");
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl PoolInner {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire(&self, route: &Route) -> Result<Permits, TransportError> {
        let per_route = Arc::clone(
            self.routes
                .entry(route.clone())
                .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_connections)))
                .value(),
        );

        let route_permit = per_route
            .acquire_owned()
            .await
            .map_err(|_| TransportError::ConnectionUnavailable)?;
        let total_permit = Arc::clone(&self.total)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::ConnectionUnavailable)?;
        Ok((route_permit, total_permit))
    }

    /// Count a new lease and hand out an idle open connection, if any.
    fn checkout_idle(&self, route: &Route) -> Option<Sender> {
        let mut state = self.lock_state();
        state.leased += 1;

        let mut reused = None;
        let mut popped = 0;
        if let Some(idle) = state.idle.get_mut(route) {
            while let Some(sender) = idle.pop() {
                popped += 1;
                if !sender.is_closed() {
                    reused = Some(sender);
                    break;
                }
            }
        }
        state.available -= popped;

        // A new connection must not push live connections past the total cap.
        if reused.is_none() && state.available + state.leased > self.config.max_connections {
            if let Some(evicted) = state.idle.values_mut().find_map(Vec::pop) {
                drop(evicted);
                state.available -= 1;
            }
        }
        reused
    }

    async fn connect(&self, route: &Route) -> Result<Sender, TransportError> {
        let io = self
            .connector
            .connect(route)
            .await
            .map_err(TransportError::Connect)?;
        let (sender, connection) = http1::handshake::<_, RequestBody>(TokioIo::new(io)).await?;

        let label = route.to_string();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(route = %label, error = %e, "Pooled connection closed with error");
            }
        });

        tracing::debug!(route = %route, "Opened new pooled connection");
        Ok(sender)
    }

    fn check_in(&self, route: &Route, sender: Option<Sender>, reusable: bool) {
        let mut state = self.lock_state();
        state.leased -= 1;

        match sender {
            Some(sender) if reusable && !state.drained && !sender.is_closed() => {
                state.idle.entry(route.clone()).or_default().push(sender);
                state.available += 1;
            }
            _ => {}
        }
    }
}

/// Counts a caller as pending for as long as it waits for capacity.
struct Waiting<'a> {
    pool: &'a PoolInner,
}

impl<'a> Waiting<'a> {
    fn register(pool: &'a PoolInner) -> Self {
        pool.lock_state().pending += 1;
        Self { pool }
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.pool.lock_state().pending -= 1;
    }
}

/// A connection assigned to one caller.
///
/// Dropping the lease closes the connection; [`Lease::release`] returns it to
/// the idle set instead.
pub struct Lease {
    pool: Arc<PoolInner>,
    route: Route,
    sender: Option<Sender>,
    reused: bool,
    reusable: bool,
    _permits: Permits,
}

impl Lease {
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Whether the connection came from the idle set.
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    pub fn sender(&mut self) -> Result<&mut SendRequest<RequestBody>, TransportError> {
        self.sender
            .as_mut()
            .ok_or(TransportError::ConnectionUnavailable)
    }

    /// Return the connection for reuse. Only call after a fully read response.
    pub fn release(mut self) {
        self.reusable = true;
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.pool
            .check_in(&self.route, self.sender.take(), self.reusable);
    }
}

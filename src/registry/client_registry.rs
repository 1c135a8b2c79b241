//! Lazily rebuilt verification client holder.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tokio::runtime::Handle;

use crate::config::{ConfigurationError, PoolConfig, Settings};
use crate::observability::StatsReporter;
use crate::pool::{Connect, ConnectionPool};
use crate::verify::{Endpoint, VerificationClient};

/// A published client together with the settings it was built from.
struct Installed {
    settings: Settings,
    client: Arc<VerificationClient>,
}

/// Hands out the current [`VerificationClient`], rebuilding it when the
/// settings change.
pub struct ClientRegistry {
    installed: ArcSwapOption<Installed>,
    /// Guards rebuilds and owns the reporter of the published pool.
    rebuild: Mutex<StatsReporter>,
    runtime: Handle,
    endpoint: Endpoint,
    connector: Option<Arc<dyn Connect>>,
}

impl ClientRegistry {
    /// Create a registry that schedules stats on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            installed: ArcSwapOption::empty(),
            rebuild: Mutex::new(StatsReporter::disabled()),
            runtime,
            endpoint: Endpoint::siteverify(),
            connector: None,
        }
    }

    /// Send verification requests to `endpoint` instead of Google.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Build pools over a custom transport.
    pub fn with_connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// The published client, if one was built.
    pub fn current(&self) -> Option<Arc<VerificationClient>> {
        self.installed
            .load_full()
            .map(|installed| Arc::clone(&installed.client))
    }

    /// Return the client for `settings`, building a new one if they differ
    /// from the settings of the published client.
    ///
    /// On a configuration error nothing is replaced.
    pub fn get_or_create(
        &self,
        settings: &Settings,
    ) -> Result<Arc<VerificationClient>, ConfigurationError> {
        if let Some(client) = self.matching(settings) {
            tracing::debug!("Verification client already instantiated");
            return Ok(client);
        }

        let mut reporter = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = self.matching(settings) {
            return Ok(client);
        }

        let config = PoolConfig::from_settings(settings)?;
        tracing::info!(config = %config, "Creating a new verification client");

        let pool = match &self.connector {
            Some(connector) => ConnectionPool::with_connector(&config, Arc::clone(connector)),
            None => ConnectionPool::new(&config),
        };
        let client = Arc::new(VerificationClient::with_endpoint(
            pool.clone(),
            self.endpoint.clone(),
        ));

        reporter.cancel();
        *reporter = StatsReporter::schedule(pool, config.stats_interval_secs, &self.runtime);

        let previous = self.installed.swap(Some(Arc::new(Installed {
            settings: settings.clone(),
            client: Arc::clone(&client),
        })));
        if let Some(previous) = previous {
            previous.client.pool().drain();
        }

        Ok(client)
    }

    fn matching(&self, settings: &Settings) -> Option<Arc<VerificationClient>> {
        self.installed
            .load_full()
            .filter(|installed| installed.settings == *settings)
            .map(|installed| Arc::clone(&installed.client))
    }
}

//! Configuration schema definitions.
//!
//! The pool is configured from a flat settings map. Every recognized key is
//! optional; absent keys fall back to the defaults below.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::error::ConfigurationError;
use crate::config::validation::validate_config;
use crate::resilience::timeouts::limit_from_millis;

/// Maximum pooled connections (total and per route).
pub const MAX_HTTP_CONNECTIONS: &str = "maxHttpConnections";
/// Milliseconds to wait for response data.
pub const API_SOCKET_TIMEOUT: &str = "apiSocketTimeout";
/// Milliseconds to establish a connection.
pub const API_CONNECT_TIMEOUT: &str = "apiConnectTimeout";
/// Milliseconds to wait for a pooled connection to be assigned.
pub const API_CONNECTION_REQUEST_TIMEOUT: &str = "apiConnectionRequestTimeout";
/// Seconds between pool stats reports, 0 disables reporting.
pub const HTTP_STATS_INTERVAL: &str = "httpStatsInterval";
/// Public site key rendered into the login form.
pub const SITE_KEY: &str = "siteKey";
/// Private secret sent to the verification API.
pub const SITE_SECRET: &str = "siteSecret";

/// Raw settings as handed over by the host.
pub type Settings = HashMap<String, String>;

/// Validated connection pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    /// Total connection cap, also used as the per-route cap.
    pub max_connections: usize,

    /// Read timeout in milliseconds (0 = no limit).
    pub socket_timeout_ms: u64,

    /// Connect timeout in milliseconds (0 = no limit).
    pub connect_timeout_ms: u64,

    /// Lease wait timeout in milliseconds (0 = no limit).
    pub connection_request_timeout_ms: u64,

    /// Stats report interval in seconds (0 = disabled).
    pub stats_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            socket_timeout_ms: 5_000,
            connect_timeout_ms: 5_000,
            connection_request_timeout_ms: 5_000,
            stats_interval_secs: 60,
        }
    }
}

impl PoolConfig {
    /// Parse and validate a configuration from a settings map.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        let defaults = Self::default();
        let config = Self {
            max_connections: read(settings, MAX_HTTP_CONNECTIONS, defaults.max_connections)?,
            socket_timeout_ms: read(settings, API_SOCKET_TIMEOUT, defaults.socket_timeout_ms)?,
            connect_timeout_ms: read(settings, API_CONNECT_TIMEOUT, defaults.connect_timeout_ms)?,
            connection_request_timeout_ms: read(
                settings,
                API_CONNECTION_REQUEST_TIMEOUT,
                defaults.connection_request_timeout_ms,
            )?,
            stats_interval_secs: read(settings, HTTP_STATS_INTERVAL, defaults.stats_interval_secs)?,
        };

        validate_config(&config)?;
        Ok(config)
    }

    pub fn socket_timeout(&self) -> Option<Duration> {
        limit_from_millis(self.socket_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        limit_from_millis(self.connect_timeout_ms)
    }

    pub fn connection_request_timeout(&self) -> Option<Duration> {
        limit_from_millis(self.connection_request_timeout_ms)
    }
}

impl fmt::Display for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maxConnections: {}; apiSocketTimeout: {}; apiConnectTimeout: {}; apiConnectionRequestTimeout: {}; httpStatsInterval: {}",
            self.max_connections,
            self.socket_timeout_ms,
            self.connect_timeout_ms,
            self.connection_request_timeout_ms,
            self.stats_interval_secs,
        )
    }
}

fn read<T>(settings: &Settings, key: &str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr<Err = std::num::ParseIntError> + fmt::Display,
{
    let Some(raw) = settings.get(key) else {
        tracing::debug!(key, value = %default, "Using default pool setting");
        return Ok(default);
    };

    let value = raw
        .parse::<T>()
        .map_err(|source| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            source,
        })?;
    tracing::info!(key, value = %value, "Loaded pool setting");
    Ok(value)
}

/// Site key and secret for the verification API.
#[derive(Clone, PartialEq, Eq)]
pub struct SiteCredentials {
    pub site_key: String,
    pub site_secret: String,
}

impl SiteCredentials {
    /// Both `siteKey` and `siteSecret` must be present.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        Some(Self {
            site_key: settings.get(SITE_KEY)?.clone(),
            site_secret: settings.get(SITE_SECRET)?.clone(),
        })
    }
}

impl fmt::Debug for SiteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteCredentials")
            .field("site_key", &self.site_key)
            .field("site_secret", &"<redacted>")
            .finish()
    }
}

//! reCAPTCHA verification gate for login forms.
//!
//! A connection-pooled client for the `siteverify` API, rebuilt lazily when
//! its settings change, with periodic pool telemetry.

pub mod config;
pub mod observability;
pub mod pool;
pub mod registry;
pub mod resilience;
pub mod verify;

pub use config::schema::{PoolConfig, Settings};
pub use pool::ConnectionPool;
pub use registry::ClientRegistry;
pub use verify::{VerificationClient, VerificationRequest};

//! Verification client registry.
//!
//! # Data Flow
//! ```text
//! login attempt with settings map
//!     → same map as the published client?  → reuse it (lock-free)
//!     → otherwise, under the rebuild lock:
//!         PoolConfig → ConnectionPool → VerificationClient
//!         → cancel old StatsReporter, schedule new one
//!         → publish (atomic swap) → drain old pool
//! ```
//!
//! # Design Decisions
//! - One registry per process, injected rather than global
//! - Readers never take a lock; rebuilds are serialized
//! - Invalid settings leave the published client in place

pub mod client_registry;

pub use client_registry::ClientRegistry;

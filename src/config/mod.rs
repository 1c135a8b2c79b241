//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings map (string keys → string values)
//!     ← loader.rs (TOML file, for the binary)
//!     → schema.rs (parse integers, apply defaults)
//!     → validation.rs (semantic checks)
//!     → PoolConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads the new map
//!     → registry compares it with the last map it saw
//! ```
//!
//! # Design Decisions
//! - The string map is the canonical form; host frameworks hand it over as-is
//! - Every key is optional and has a documented default
//! - A malformed value rejects the whole configuration, never defaults silently

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use error::ConfigurationError;
pub use schema::{PoolConfig, Settings, SiteCredentials};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (integer parsing happens in schema.rs)
//! - Reject values the pool cannot be built with
//!
//! # Design Decisions
//! - No upper bounds: operators are trusted with large pools and long timeouts
//! - A zero timeout is legal and means "no limit"

use crate::config::error::ConfigurationError;
use crate::config::schema::PoolConfig;

/// Check a parsed configuration before any pool is built from it.
pub fn validate_config(config: &PoolConfig) -> Result<(), ConfigurationError> {
    if config.max_connections == 0 {
        return Err(ConfigurationError::ZeroConnections);
    }
    Ok(())
}

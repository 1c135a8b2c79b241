//! Configuration error definitions.

use std::num::ParseIntError;
use thiserror::Error;

/// Errors raised while turning settings into a [`PoolConfig`](super::PoolConfig).
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A recognized key holds something that is not a non-negative integer.
    #[error("invalid value {value:?} for `{key}`: {source}")]
    InvalidValue {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The pool needs room for at least one connection.
    #[error("`maxHttpConnections` must be greater than zero")]
    ZeroConnections,

    /// Settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML.
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings file holds a table, array or float where a scalar is expected.
    #[error("unsupported value for `{key}`: expected a string, integer or boolean")]
    UnsupportedValue { key: String },
}

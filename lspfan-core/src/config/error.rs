//! Configuration error types.

use thiserror::Error;

/// Engine configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An empty prefix would make every string `data` field look like a token.
    #[error("token prefix must not be empty")]
    EmptyTokenPrefix,

    /// An aggregation window of zero flushes before any backend can reply.
    #[error("aggregation timeout for {scope} must be > 0")]
    ZeroTimeout { scope: &'static str },

    /// The data cookie store must hold at least one record.
    #[error("max_data_cookies must be > 0")]
    ZeroCookieCapacity,
}

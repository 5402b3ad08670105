//! Default values and environment overrides for [`EngineConfig`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ConfigError;

/// Default prefix of stashed `data` tokens.
pub const DEFAULT_TOKEN_PREFIX: &str = "lspfan-";

/// Aggregation window for `textDocument/publishDiagnostics` (ms).
pub const DEFAULT_DIAGNOSTICS_TIMEOUT_MS: u64 = 1000;

/// Aggregation window for everything else the scheduler aggregates (ms).
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

/// Upper bound on live stashed `data` records per session.
pub const DEFAULT_MAX_DATA_COOKIES: usize = 4096;

/// Tunables for one [`LspLogic`](crate::LspLogic) instance.
///
/// Every field has a default, so an empty table deserializes to
/// [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Prefix of tokens that replace stashed `data` values.
    pub token_prefix: String,

    /// Aggregation window for diagnostics notifications.
    pub diagnostics_timeout_ms: u64,

    /// Aggregation window for all other aggregated traffic.
    pub default_timeout_ms: u64,

    /// Maximum live stashed `data` records; the oldest is evicted beyond this.
    pub max_data_cookies: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            diagnostics_timeout_ms: DEFAULT_DIAGNOSTICS_TIMEOUT_MS,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_data_cookies: DEFAULT_MAX_DATA_COOKIES,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// # Environment Variables
    /// - `LSPFAN_TOKEN_PREFIX`
    /// - `LSPFAN_DIAGNOSTICS_TIMEOUT_MS`
    /// - `LSPFAN_DEFAULT_TIMEOUT_MS`
    /// - `LSPFAN_MAX_DATA_COOKIES`
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            token_prefix: std::env::var("LSPFAN_TOKEN_PREFIX").unwrap_or(default.token_prefix),

            diagnostics_timeout_ms: parse_env_warn(
                "LSPFAN_DIAGNOSTICS_TIMEOUT_MS",
                default.diagnostics_timeout_ms,
            ),

            default_timeout_ms: parse_env_warn(
                "LSPFAN_DEFAULT_TIMEOUT_MS",
                default.default_timeout_ms,
            ),

            max_data_cookies: parse_env_warn("LSPFAN_MAX_DATA_COOKIES", default.max_data_cookies),
        }
    }

    /// Check the config invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_prefix.is_empty() {
            return Err(ConfigError::EmptyTokenPrefix);
        }

        if self.diagnostics_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                scope: "diagnostics",
            });
        }

        if self.default_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout { scope: "default" });
        }

        if self.max_data_cookies == 0 {
            return Err(ConfigError::ZeroCookieCapacity);
        }

        Ok(())
    }
}

/// Parse an environment variable with a warning on invalid values.
fn parse_env_warn<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(val) => match val.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    env_var = name,
                    value = %val,
                    default = %default,
                    "Invalid value for environment variable, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

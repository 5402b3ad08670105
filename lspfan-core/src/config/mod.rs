//! Engine configuration.
//!
//! The engine has no config file of its own. Hosts either embed an
//! [`EngineConfig`] in their own (serde) config or build one from
//! environment variables with [`EngineConfig::from_env`].

mod defaults;
mod error;

pub use defaults::*;
pub use error::ConfigError;

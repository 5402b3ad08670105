//! LSP protocol vocabulary used by the routing and merge rules.
//!
//! - [`LspMethod`]: closed set of methods the engine treats specially
//! - capability names and JSON predicates over capability values

mod capability;
mod methods;

pub use capability::*;
pub use methods::*;

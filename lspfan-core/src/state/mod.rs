//! Per-session mutable state.
//!
//! Both tables are owned by one [`LspLogic`](crate::LspLogic) and live
//! exactly as long as the client session.

mod cookies;
mod versions;

pub use cookies::{DataCookie, DataCookieStore, Stashed};
pub use versions::DocumentVersions;

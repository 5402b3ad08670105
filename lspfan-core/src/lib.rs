//! Routing and merging engine for an LSP multiplexer.
//!
//! One LSP client talks to several language servers through a proxy. This
//! library holds the proxy's decision logic:
//!
//! - which backend(s) receive each client message ([`LspLogic::servers_to_route_to`])
//! - per-document version bookkeeping ([`LspLogic::on_client_notification`])
//! - reply rewriting: diagnostic attribution, opaque `data` stashing and
//!   server identity updates ([`LspLogic::on_server_response`],
//!   [`LspLogic::on_server_notification`])
//! - aggregation policy: keys, staleness drops, window lengths and payload
//!   merging ([`LspLogic::notification_aggregation_key`],
//!   [`LspLogic::aggregation_timeout_ms`], [`LspLogic::aggregate_payloads`])
//!
//! Transport, process management and the aggregation scheduler that owns
//! timers live outside this crate. Every entry point is a synchronous
//! computation over explicit arguments.

pub mod aggregation;
pub mod config;
pub mod engine;
pub mod merge;
pub mod postprocess;
pub mod protocol;
pub mod routing;
pub mod server;
pub mod state;
pub mod telemetry;

pub use aggregation::{AggregationDecision, AggregationKey};
pub use config::{ConfigError, EngineConfig};
pub use engine::{LspLogic, SharedLspLogic};
pub use protocol::LspMethod;
pub use server::{Server, ServerHandle};
pub use state::{DataCookie, DataCookieStore, DocumentVersions};
pub use telemetry::EngineMetrics;

//! Aggregation policy for replies from several backends.
//!
//! The external scheduler owns the aggregation windows and their timers. For
//! each backend reply it asks this module three things:
//!
//! 1. [`LspLogic::notification_aggregation_key`]: pass through, drop, or
//!    bucket under a key
//! 2. [`LspLogic::aggregation_timeout_ms`]: how long a window stays open
//! 3. [`LspLogic::aggregate_payloads`]: fold a reply into the running
//!    aggregate
//!
//! Only `textDocument/publishDiagnostics` notifications are ever keyed.
//! Request replies are correlated by id, and windowing them is the
//! scheduler's business.

mod initialize;
mod key;
mod payload;

pub use key::{AggregationDecision, AggregationKey, NOTIFICATION_TAG};

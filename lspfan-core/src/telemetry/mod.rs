//! Prometheus metrics for the routing engine.
//!
//! # Submodules
//!
//! - [`prom_metrics`] - [`EngineMetrics`] registered on a `prometheus-client` registry
//! - [`cardinality`] - label cardinality limiter for method-name labels

pub mod cardinality;
pub mod prom_metrics;

pub use prom_metrics::{EngineMetrics, RouteRule};

//! Engine metrics using the prometheus-client crate.
//!
//! The host owns the [`Registry`] and the `/metrics` exposition. This module
//! only registers and updates the engine's own series. All names carry the
//! `lspfan_` prefix.

use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use super::cardinality::CardinalityLimiter;

/// Distinct method names tracked before labels collapse to `__other__`.
const METHOD_LABEL_LIMIT: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Label Sets
// ─────────────────────────────────────────────────────────────────────────────

/// Which routing rule produced a decision.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum RouteRule {
    /// A stashed `data` token was recovered; routed to its origin.
    Cookie,
    /// `initialize` / `shutdown`: every server.
    Broadcast,
    /// Every server announcing the method's capability.
    CapabilityFanout,
    /// First server announcing the method's capability.
    CapabilitySingle,
    /// Primary server.
    Default,
    /// No server qualified; the message goes nowhere.
    Unroutable,
}

/// Labels for route decision counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub rule: RouteRule,
}

/// Labels for per-method counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MethodLabels {
    /// LSP method name (cardinality-limited)
    pub method: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// EngineMetrics
// ─────────────────────────────────────────────────────────────────────────────

/// Prometheus series for one or more engine instances.
///
/// Several sessions may share one `EngineMetrics` behind an `Arc`; every
/// field is internally synchronized.
pub struct EngineMetrics {
    /// Routing decisions by rule.
    pub route_decisions_total: Family<RouteLabels, Counter>,

    /// Diagnostics notifications dropped as stale.
    pub stale_diagnostics_dropped_total: Counter,

    /// `data` values replaced by tokens.
    pub data_cookies_stashed_total: Counter,

    /// Stashed records evicted by the capacity bound.
    pub data_cookies_evicted_total: Counter,

    /// Live stashed records, summed over every session sharing this instance.
    pub data_cookies_live: Gauge,

    /// Error replies excluded from aggregation, by method.
    pub error_replies_skipped_total: Family<MethodLabels, Counter>,

    method_limiter: CardinalityLimiter,
}

impl EngineMetrics {
    /// Create and register all metrics with the given registry.
    pub fn new(registry: &mut Registry) -> Self {
        let route_decisions_total = Family::<RouteLabels, Counter>::default();
        registry.register(
            "lspfan_route_decisions",
            "Routing decisions by rule",
            route_decisions_total.clone(),
        );

        let stale_diagnostics_dropped_total = Counter::default();
        registry.register(
            "lspfan_stale_diagnostics_dropped",
            "Diagnostics notifications dropped because a newer document version is tracked",
            stale_diagnostics_dropped_total.clone(),
        );

        let data_cookies_stashed_total = Counter::default();
        registry.register(
            "lspfan_data_cookies_stashed",
            "Opaque data fields replaced by recovery tokens",
            data_cookies_stashed_total.clone(),
        );

        let data_cookies_evicted_total = Counter::default();
        registry.register(
            "lspfan_data_cookies_evicted",
            "Stashed data records evicted by the capacity bound",
            data_cookies_evicted_total.clone(),
        );

        let data_cookies_live = Gauge::default();
        registry.register(
            "lspfan_data_cookies_live",
            "Stashed data records currently held",
            data_cookies_live.clone(),
        );

        let error_replies_skipped_total = Family::<MethodLabels, Counter>::default();
        registry.register(
            "lspfan_error_replies_skipped",
            "Error replies excluded from aggregation",
            error_replies_skipped_total.clone(),
        );

        Self {
            route_decisions_total,
            stale_diagnostics_dropped_total,
            data_cookies_stashed_total,
            data_cookies_evicted_total,
            data_cookies_live,
            error_replies_skipped_total,
            method_limiter: CardinalityLimiter::new(METHOD_LABEL_LIMIT),
        }
    }

    pub fn record_route(&self, rule: RouteRule) {
        self.route_decisions_total
            .get_or_create(&RouteLabels { rule })
            .inc();
    }

    pub fn record_stale_drop(&self) {
        self.stale_diagnostics_dropped_total.inc();
    }

    /// Record one stash. An eviction replaces a live record, so the live
    /// count only grows when nothing was evicted.
    pub fn record_stash(&self, evicted: bool) {
        self.data_cookies_stashed_total.inc();
        if evicted {
            self.data_cookies_evicted_total.inc();
        } else {
            self.data_cookies_live.inc();
        }
    }

    /// Record `count` live records released when a session ends.
    pub fn record_cookies_released(&self, count: usize) {
        self.data_cookies_live
            .dec_by(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn record_error_skipped(&self, method: &str) {
        let method = self.method_limiter.resolve(method).to_string();
        self.error_replies_skipped_total
            .get_or_create(&MethodLabels { method })
            .inc();
    }
}

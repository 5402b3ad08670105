//! Aggregation keys, staleness drops and window lengths.

use serde_json::Value;
use tracing::debug;

use crate::engine::LspLogic;
use crate::protocol::LspMethod;

/// Tag of keys that bucket server notifications.
pub const NOTIFICATION_TAG: &str = "notification";

/// Bucket for concurrent notifications that merge into one.
///
/// Diagnostics for the same document and version share a key no matter
/// which backend sent them. Different versions never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub tag: &'static str,
    pub method: String,
    pub uri: String,
    pub version: i64,
}

/// What the scheduler should do with a server notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregationDecision {
    /// Forward on its own, without aggregation.
    Passthrough,
    /// Discard: it describes an older document state than the one tracked.
    Drop,
    /// Merge with others sharing this key.
    Key(AggregationKey),
}

impl AggregationDecision {
    /// Returns the key, if the notification aggregates.
    #[must_use]
    pub fn key(&self) -> Option<&AggregationKey> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }
}

impl LspLogic {
    /// Classifies a server notification for aggregation.
    ///
    /// A diagnostics notification without a version is keyed at the tracked
    /// version of its document, or 0 if the document is not tracked. One
    /// whose version is below the tracked version is dropped. A version that
    /// is not an integer is compared numerically for the staleness check and
    /// otherwise passes through unaggregated.
    #[must_use]
    pub fn notification_aggregation_key(&self, method: &str, payload: &Value) -> AggregationDecision {
        match LspMethod::parse(method) {
            LspMethod::PublishDiagnostics => self.diagnostics_key(payload),
            _ => AggregationDecision::Passthrough,
        }
    }

    fn diagnostics_key(&self, payload: &Value) -> AggregationDecision {
        let uri = payload.get("uri").and_then(Value::as_str).unwrap_or("");
        let tracked = self.versions.get(uri);

        let version = match (ReportedVersion::of(payload), tracked) {
            (ReportedVersion::Exact(reported), Some(tracked)) if reported < tracked => {
                return self.drop_stale(uri, tracked);
            }
            (ReportedVersion::Exact(reported), _) => reported,
            (ReportedVersion::Absent, Some(tracked)) => tracked,
            (ReportedVersion::Absent, None) => 0,
            (ReportedVersion::Inexact(reported), Some(tracked)) if reported < tracked as f64 => {
                return self.drop_stale(uri, tracked);
            }
            (ReportedVersion::Inexact(_) | ReportedVersion::Invalid, _) => {
                debug!(uri, "Diagnostics version is not an integer, not aggregating");
                return AggregationDecision::Passthrough;
            }
        };

        AggregationDecision::Key(AggregationKey {
            tag: NOTIFICATION_TAG,
            method: LspMethod::PublishDiagnostics.as_str().to_string(),
            uri: uri.to_string(),
            version,
        })
    }

    fn drop_stale(&self, uri: &str, tracked: i64) -> AggregationDecision {
        debug!(uri, tracked, "Dropping stale diagnostics");
        if let Some(metrics) = self.metrics() {
            metrics.record_stale_drop();
        }
        AggregationDecision::Drop
    }

    /// Length of the aggregation window for `method`, in milliseconds.
    #[must_use]
    pub fn aggregation_timeout_ms(&self, method: &str) -> u64 {
        match LspMethod::parse(method) {
            LspMethod::PublishDiagnostics => self.config.diagnostics_timeout_ms,
            _ => self.config.default_timeout_ms,
        }
    }
}

/// The `version` field of a diagnostics notification.
enum ReportedVersion {
    /// Missing or `null`.
    Absent,
    Exact(i64),
    /// A number that does not fit `i64` (`3.0`, `1e20`, `u64::MAX`).
    Inexact(f64),
    /// Present but not a number.
    Invalid,
}

impl ReportedVersion {
    fn of(payload: &Value) -> Self {
        match payload.get("version") {
            None | Some(Value::Null) => Self::Absent,
            Some(version) => match (version.as_i64(), version.as_f64()) {
                (Some(exact), _) => Self::Exact(exact),
                (None, Some(inexact)) => Self::Inexact(inexact),
                (None, None) => Self::Invalid,
            },
        }
    }
}

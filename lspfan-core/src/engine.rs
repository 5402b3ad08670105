//! Session-scoped routing engine.
//!
//! [`LspLogic`] owns every piece of mutable session state: the document
//! version table and the `data` cookie store. Server identities are shared
//! with the transport through [`ServerHandle`]. Its entry points are spread
//! across modules by concern:
//!
//! | Concern | Entry point | Module |
//! |---------|-------------|--------|
//! | Routing | [`LspLogic::servers_to_route_to`] | [`routing`](crate::routing) |
//! | Client notifications | [`LspLogic::on_client_notification`] | here |
//! | Reply rewriting | [`LspLogic::on_server_response`], [`LspLogic::on_server_notification`] | [`postprocess`](crate::postprocess) |
//! | Aggregation | [`LspLogic::notification_aggregation_key`], [`LspLogic::aggregation_timeout_ms`], [`LspLogic::aggregate_payloads`] | [`aggregation`](crate::aggregation) |
//!
//! # Concurrency
//!
//! `LspLogic` is a plain `&mut self` state machine. Hosts that deliver
//! replies from several tasks wrap it in [`SharedLspLogic`], which serializes
//! every call behind one lock.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::aggregation::AggregationDecision;
use crate::config::{ConfigError, EngineConfig};
use crate::protocol::LspMethod;
use crate::server::ServerHandle;
use crate::state::{DataCookieStore, DocumentVersions};
use crate::telemetry::EngineMetrics;

/// Routing and merging policy for one client session.
pub struct LspLogic {
    pub(crate) primary: ServerHandle,
    pub(crate) config: EngineConfig,
    pub(crate) versions: DocumentVersions,
    pub(crate) cookies: DataCookieStore,
    pub(crate) metrics: Option<Arc<EngineMetrics>>,
}

impl LspLogic {
    /// Creates an engine with default configuration.
    ///
    /// `primary` receives every message no other rule claims.
    #[must_use]
    pub fn new(primary: ServerHandle) -> Self {
        Self::build(primary, EngineConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn with_config(primary: ServerHandle, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(primary, config))
    }

    fn build(primary: ServerHandle, config: EngineConfig) -> Self {
        let cookies = DataCookieStore::new(config.token_prefix.clone(), config.max_data_cookies);
        Self {
            primary,
            config,
            versions: DocumentVersions::new(),
            cookies,
            metrics: None,
        }
    }

    /// Attaches a metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn primary_server(&self) -> &ServerHandle {
        &self.primary
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn document_versions(&self) -> &DocumentVersions {
        &self.versions
    }

    #[must_use]
    pub fn data_cookies(&self) -> &DataCookieStore {
        &self.cookies
    }

    pub(crate) fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_deref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Client Notifications
    // ─────────────────────────────────────────────────────────────────────────

    /// Tracks document versions from client notifications.
    ///
    /// `didOpen` and `didChange` record `textDocument.version` for
    /// `textDocument.uri` when both are present. `didClose` forgets the URI.
    /// `exit` ends the session (see [`LspLogic::end_session`]). Other
    /// notifications, and notifications missing either field, are ignored.
    pub fn on_client_notification(&mut self, method: &str, params: &Value) {
        let text_document = params.get("textDocument");
        let uri = text_document
            .and_then(|doc| doc.get("uri"))
            .and_then(Value::as_str);

        match LspMethod::parse(method) {
            LspMethod::DidOpen | LspMethod::DidChange => {
                let version = text_document
                    .and_then(|doc| doc.get("version"))
                    .and_then(Value::as_i64);
                if let (Some(uri), Some(version)) = (uri, version) {
                    debug!(uri, version, "Tracking document version");
                    self.versions.record(uri, version);
                }
            }
            LspMethod::DidClose => {
                if let Some(uri) = uri {
                    self.versions.forget(uri);
                }
            }
            LspMethod::Exit => self.end_session(),
            _ => {}
        }
    }

    /// Drops all per-session state: tracked versions and stashed `data`.
    ///
    /// Tokens minted afterwards stay distinct from earlier ones.
    pub fn end_session(&mut self) {
        debug!(
            documents = self.versions.len(),
            cookies = self.cookies.len(),
            "Ending session"
        );
        self.versions.clear();
        self.release_cookies();
    }

    fn release_cookies(&mut self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cookies_released(self.cookies.len());
        }
        self.cookies.clear();
    }
}

impl Drop for LspLogic {
    fn drop(&mut self) {
        self.release_cookies();
    }
}

impl fmt::Debug for LspLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LspLogic")
            .field("primary", &self.primary)
            .field("config", &self.config)
            .field("versions", &self.versions)
            .field("cookies", &self.cookies.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SharedLspLogic
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-safe handle to one session's [`LspLogic`].
///
/// Each method takes the session lock for the duration of a single call, so
/// calls from concurrent reply paths are applied one at a time. An aggregate
/// passed to [`SharedLspLogic::aggregate_payloads`] must still be owned by a
/// single caller for its whole aggregation window.
#[derive(Clone)]
pub struct SharedLspLogic {
    inner: Arc<Mutex<LspLogic>>,
}

impl SharedLspLogic {
    #[must_use]
    pub fn new(logic: LspLogic) -> Self {
        Self {
            inner: Arc::new(Mutex::new(logic)),
        }
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut LspLogic) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn servers_to_route_to(
        &self,
        method: &str,
        params: &mut Value,
        servers: &[ServerHandle],
    ) -> Vec<ServerHandle> {
        self.inner.lock().servers_to_route_to(method, params, servers)
    }

    pub fn on_client_notification(&self, method: &str, params: &Value) {
        self.inner.lock().on_client_notification(method, params);
    }

    pub fn end_session(&self) {
        self.inner.lock().end_session();
    }

    pub fn on_server_response(
        &self,
        method: &str,
        payload: &mut Value,
        is_error: bool,
        server: &ServerHandle,
    ) {
        self.inner
            .lock()
            .on_server_response(method, payload, is_error, server);
    }

    pub fn on_server_notification(&self, method: &str, params: &mut Value, source: &ServerHandle) {
        self.inner
            .lock()
            .on_server_notification(method, params, source);
    }

    #[must_use]
    pub fn notification_aggregation_key(&self, method: &str, payload: &Value) -> AggregationDecision {
        self.inner
            .lock()
            .notification_aggregation_key(method, payload)
    }

    #[must_use]
    pub fn aggregation_timeout_ms(&self, method: &str) -> u64 {
        self.inner.lock().aggregation_timeout_ms(method)
    }

    #[must_use]
    pub fn aggregate_payloads(
        &self,
        method: &str,
        aggregate: Value,
        payload: Value,
        source: &ServerHandle,
        is_error: bool,
    ) -> Value {
        self.inner
            .lock()
            .aggregate_payloads(method, aggregate, payload, source, is_error)
    }
}

impl fmt::Debug for SharedLspLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLspLogic").finish_non_exhaustive()
    }
}

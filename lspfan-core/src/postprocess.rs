//! Rewriting of backend replies before they reach the client or an
//! aggregate.
//!
//! - `textDocument/codeAction` results have each item's `data` stashed
//!   behind a token so a later `codeAction/resolve` can be routed back.
//! - `initialize` results update the replying server's name and
//!   capabilities.
//! - `textDocument/publishDiagnostics` notifications have diagnostics
//!   without a `source` attributed to the sending server.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::engine::LspLogic;
use crate::protocol::{LspMethod, is_truthy};
use crate::server::ServerHandle;

impl LspLogic {
    /// Post-processes a backend's reply to a client request.
    ///
    /// Error replies and falsy payloads (`null`, `[]`, `{}`, ...) pass
    /// through untouched.
    pub fn on_server_response(
        &mut self,
        method: &str,
        payload: &mut Value,
        is_error: bool,
        server: &ServerHandle,
    ) {
        if is_error || !is_truthy(payload) {
            return;
        }

        match LspMethod::parse(method) {
            LspMethod::CodeAction => {
                if let Some(actions) = payload.as_array_mut() {
                    for action in actions {
                        self.stash_data(action, server);
                    }
                }
            }
            LspMethod::Initialize => update_server_identity(payload, server),
            _ => {}
        }
    }

    /// Post-processes a notification sent by a backend.
    pub fn on_server_notification(&self, method: &str, params: &mut Value, source: &ServerHandle) {
        if LspMethod::parse(method) == LspMethod::PublishDiagnostics {
            if let Some(diagnostics) = params
                .get_mut("diagnostics")
                .and_then(Value::as_array_mut)
            {
                attribute_diagnostics(diagnostics, source);
            }
        }
    }

    /// Replaces `item.data` with a fresh token, if `item` carries one.
    fn stash_data(&mut self, item: &mut Value, server: &ServerHandle) {
        let Some(slot) = item.as_object_mut().and_then(|fields| fields.get_mut("data")) else {
            return;
        };

        let stashed = self.cookies.stash(std::mem::take(slot), server.clone());
        if let Some(evicted) = &stashed.evicted {
            warn!(
                evicted = %evicted,
                capacity = self.config.max_data_cookies,
                "Data cookie store full, evicted oldest record"
            );
        }
        if let Some(metrics) = self.metrics() {
            metrics.record_stash(stashed.evicted.is_some());
        }
        debug!(token = %stashed.token, server = %server.name(), "Stashed item data");

        *slot = Value::String(stashed.token);
    }
}

/// Sets `source` on every diagnostic that lacks one.
pub(crate) fn attribute_diagnostics(diagnostics: &mut [Value], source: &ServerHandle) {
    let mut name: Option<String> = None;
    for diagnostic in diagnostics {
        if let Some(fields) = diagnostic.as_object_mut() {
            if !fields.contains_key("source") {
                let name = name.get_or_insert_with(|| source.name());
                fields.insert("source".to_string(), Value::String(name.clone()));
            }
        }
    }
}

/// Applies an `initialize` result to the replying server.
///
/// Only a string `serverInfo.name` is adopted; any other value keeps the
/// current name.
fn update_server_identity(result: &Value, server: &ServerHandle) {
    if let Some(name) = result
        .get("serverInfo")
        .and_then(|info| info.get("name"))
        .and_then(Value::as_str)
    {
        server.set_name(name);
    }

    let capabilities = match result.get("capabilities") {
        Some(Value::Object(caps)) => caps.clone(),
        _ => Map::new(),
    };
    debug!(
        server = %server.name(),
        capabilities = capabilities.len(),
        "Updated server identity from initialize"
    );
    server.set_capabilities(capabilities);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> (LspLogic, ServerHandle) {
        let primary = ServerHandle::new("primary");
        (LspLogic::new(primary.clone()), primary)
    }

    #[test]
    fn test_code_action_data_is_stashed() {
        let (mut logic, _) = engine();
        let server = ServerHandle::new("ruff");
        let mut payload = json!([
            {"title": "Organize imports", "data": {"uri": "file:///a.py"}},
            {"title": "No data"},
            null,
            {"title": "Null data", "data": null},
        ]);

        logic.on_server_response("textDocument/codeAction", &mut payload, false, &server);

        assert_eq!(payload[0]["data"], "lspfan-1");
        assert!(payload[1].get("data").is_none());
        assert_eq!(payload[2], Value::Null);
        assert_eq!(payload[3]["data"], "lspfan-2");

        let cookie = logic.data_cookies().recover("lspfan-1").unwrap();
        assert_eq!(cookie.data, json!({"uri": "file:///a.py"}));
        assert_eq!(cookie.server, server);
        assert_eq!(logic.data_cookies().recover("lspfan-2").unwrap().data, Value::Null);
    }

    #[test]
    fn test_stashed_data_keeps_field_order_stable() {
        let (mut logic, server) = engine();
        let mut payload = json!([{"title": "t", "data": 1, "kind": "quickfix"}]);
        logic.on_server_response("textDocument/codeAction", &mut payload, false, &server);

        let keys: Vec<_> = payload[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["title", "data", "kind"]);
    }

    #[test]
    fn test_error_and_empty_replies_are_untouched() {
        let (mut logic, server) = engine();

        let mut payload = json!([{"title": "t", "data": 1}]);
        logic.on_server_response("textDocument/codeAction", &mut payload, true, &server);
        assert_eq!(payload[0]["data"], 1);

        let mut payload = Value::Null;
        logic.on_server_response("initialize", &mut payload, false, &server);
        assert_eq!(server.name(), "primary");
        assert!(logic.data_cookies().is_empty());
    }

    #[test]
    fn test_initialize_updates_name_and_replaces_capabilities() {
        let (mut logic, _) = engine();
        let server = ServerHandle::with_capabilities(
            "spawned",
            json!({"hoverProvider": true}).as_object().cloned().unwrap(),
        );
        let mut payload = json!({
            "capabilities": {"renameProvider": true},
            "serverInfo": {"name": "basedpyright", "version": "1.2"}
        });

        logic.on_server_response("initialize", &mut payload, false, &server);

        assert_eq!(server.name(), "basedpyright");
        assert!(server.has_capability("renameProvider"));
        assert!(!server.has_capability("hoverProvider"));
    }

    #[test]
    fn test_initialize_ignores_non_string_name() {
        let (mut logic, _) = engine();
        let server = ServerHandle::new("spawned");
        let mut payload = json!({"capabilities": {}, "serverInfo": {"name": 42}});

        logic.on_server_response("initialize", &mut payload, false, &server);

        assert_eq!(server.name(), "spawned");
    }

    #[test]
    fn test_initialize_without_capabilities_clears_them() {
        let (mut logic, _) = engine();
        let server = ServerHandle::with_capabilities(
            "spawned",
            json!({"hoverProvider": true}).as_object().cloned().unwrap(),
        );
        let mut payload = json!({"serverInfo": {"version": "0.1"}});

        logic.on_server_response("initialize", &mut payload, false, &server);

        assert_eq!(server.name(), "spawned");
        assert!(server.capabilities().is_empty());
    }

    #[test]
    fn test_diagnostics_get_source_attribution() {
        let (logic, _) = engine();
        let server = ServerHandle::new("eslint");
        let mut params = json!({
            "uri": "file:///a.ts",
            "diagnostics": [
                {"message": "unused"},
                {"message": "typo", "source": "cspell"},
            ]
        });

        logic.on_server_notification("textDocument/publishDiagnostics", &mut params, &server);

        assert_eq!(params["diagnostics"][0]["source"], "eslint");
        assert_eq!(params["diagnostics"][1]["source"], "cspell");
    }

    #[test]
    fn test_other_notifications_pass_through() {
        let (logic, server) = engine();
        let mut params = json!({"diagnostics": [{"message": "m"}]});
        let original = params.clone();

        logic.on_server_notification("window/logMessage", &mut params, &server);
        assert_eq!(params, original);
    }
}

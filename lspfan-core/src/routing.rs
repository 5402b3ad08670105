//! Client message routing.
//!
//! Decides which backends receive a client request or notification. Rules
//! are evaluated in order and the first match wins:
//!
//! 1. **Cookie recovery**: a `*/resolve` request whose `params.data` is a
//!    known token goes back to the server that produced the item, with the
//!    original `data` restored.
//! 2. **Broadcast**: `initialize` and `shutdown` go to every server.
//! 3. **Capability fan-out**: `textDocument/codeAction` goes to every server
//!    announcing `codeActionProvider`.
//! 4. **Capability single**: rename and formatting go to the first server
//!    announcing the matching provider, or nowhere.
//! 5. **Default**: the primary server.

use serde_json::Value;
use tracing::debug;

use crate::engine::LspLogic;
use crate::protocol::{self, LspMethod};
use crate::server::ServerHandle;
use crate::telemetry::RouteRule;

impl LspLogic {
    /// Selects the servers that should receive a client message.
    ///
    /// `servers` lists the candidates, primary first. `params` is rewritten
    /// in place when a stashed `data` token is recovered. An empty result
    /// means no backend should receive the message.
    pub fn servers_to_route_to(
        &self,
        method: &str,
        params: &mut Value,
        servers: &[ServerHandle],
    ) -> Vec<ServerHandle> {
        let method = LspMethod::parse(method);
        let (targets, rule) = self.route(method, params, servers);

        debug!(
            method = %method,
            rule = ?rule,
            targets = targets.len(),
            "Routed client message"
        );
        if let Some(metrics) = self.metrics() {
            metrics.record_route(rule);
        }

        targets
    }

    fn route(
        &self,
        method: LspMethod<'_>,
        params: &mut Value,
        servers: &[ServerHandle],
    ) -> (Vec<ServerHandle>, RouteRule) {
        if method.is_resolve() {
            if let Some(origin) = self.recover_data(params) {
                return (vec![origin], RouteRule::Cookie);
            }
        }

        if method.is_broadcast() {
            return (servers.to_vec(), RouteRule::Broadcast);
        }

        if method == LspMethod::CodeAction {
            let targets = servers
                .iter()
                .filter(|s| s.has_capability(protocol::CODE_ACTION_PROVIDER))
                .cloned()
                .collect();
            return (targets, RouteRule::CapabilityFanout);
        }

        if let Some(capability) = method.required_capability() {
            return match servers.iter().find(|s| s.has_capability(capability)) {
                Some(server) => (vec![server.clone()], RouteRule::CapabilitySingle),
                None => {
                    debug!(method = %method, capability, "No server provides capability");
                    (Vec::new(), RouteRule::Unroutable)
                }
            };
        }

        if servers.is_empty() {
            (Vec::new(), RouteRule::Unroutable)
        } else {
            (vec![self.primary.clone()], RouteRule::Default)
        }
    }

    /// Restores a stashed `data` value and returns its origin server.
    ///
    /// `None` (with `params` untouched) when `params.data` is not a token or
    /// the token is unknown.
    fn recover_data(&self, params: &mut Value) -> Option<ServerHandle> {
        let data = params.as_object_mut()?.get_mut("data")?;
        let token = data.as_str()?;
        if !self.cookies.is_token(token) {
            return None;
        }

        let Some(cookie) = self.cookies.recover(token) else {
            debug!(token, "Unknown data token, using default routing");
            return None;
        };

        *data = cookie.data.clone();
        Some(cookie.server.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn caps(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    struct Fixture {
        logic: LspLogic,
        primary: ServerHandle,
        secondary: ServerHandle,
        tertiary: ServerHandle,
    }

    impl Fixture {
        fn new() -> Self {
            let primary = ServerHandle::with_capabilities(
                "primary",
                caps(json!({"codeActionProvider": true, "renameProvider": false})),
            );
            let secondary = ServerHandle::with_capabilities(
                "secondary",
                caps(json!({"renameProvider": {"prepareProvider": true}, "documentFormattingProvider": true})),
            );
            let tertiary = ServerHandle::with_capabilities(
                "tertiary",
                caps(json!({"codeActionProvider": {"resolveProvider": true}, "documentFormattingProvider": true})),
            );
            Self {
                logic: LspLogic::new(primary.clone()),
                primary,
                secondary,
                tertiary,
            }
        }

        fn servers(&self) -> Vec<ServerHandle> {
            vec![
                self.primary.clone(),
                self.secondary.clone(),
                self.tertiary.clone(),
            ]
        }

        fn route(&self, method: &str) -> Vec<ServerHandle> {
            self.logic
                .servers_to_route_to(method, &mut json!({}), &self.servers())
        }
    }

    #[test]
    fn test_broadcast_methods_reach_every_server() {
        let fx = Fixture::new();
        assert_eq!(fx.route("initialize"), fx.servers());
        assert_eq!(fx.route("shutdown"), fx.servers());
    }

    #[test]
    fn test_code_action_fans_out_to_capable_servers() {
        let fx = Fixture::new();
        assert_eq!(
            fx.route("textDocument/codeAction"),
            vec![fx.primary.clone(), fx.tertiary.clone()]
        );
    }

    #[test]
    fn test_single_target_picks_first_capable_in_order() {
        let fx = Fixture::new();
        assert_eq!(fx.route("textDocument/rename"), vec![fx.secondary.clone()]);
        assert_eq!(
            fx.route("textDocument/formatting"),
            vec![fx.secondary.clone()]
        );
    }

    #[test]
    fn test_single_target_without_capable_server_is_empty() {
        let fx = Fixture::new();
        assert!(fx.route("textDocument/rangeFormatting").is_empty());
    }

    #[test]
    fn test_default_routes_to_primary() {
        let fx = Fixture::new();
        assert_eq!(fx.route("textDocument/hover"), vec![fx.primary.clone()]);
        assert_eq!(fx.route("workspace/symbol"), vec![fx.primary.clone()]);
    }

    #[test]
    fn test_default_with_no_servers_is_empty() {
        let fx = Fixture::new();
        let targets = fx
            .logic
            .servers_to_route_to("textDocument/hover", &mut json!({}), &[]);
        assert!(targets.is_empty());
    }

    #[test]
    fn test_default_uses_primary_even_if_not_first() {
        let fx = Fixture::new();
        let servers = vec![fx.secondary.clone(), fx.primary.clone()];
        let targets = fx
            .logic
            .servers_to_route_to("textDocument/hover", &mut json!({}), &servers);
        assert_eq!(targets, vec![fx.primary.clone()]);
    }

    #[test]
    fn test_resolve_recovers_stashed_data_and_origin() {
        let mut fx = Fixture::new();
        let stashed = fx
            .logic
            .cookies
            .stash(json!({"edit": 7}), fx.tertiary.clone());

        let mut params = json!({"title": "Fix", "data": stashed.token});
        let targets =
            fx.logic
                .servers_to_route_to("codeAction/resolve", &mut params, &fx.servers());

        assert_eq!(targets, vec![fx.tertiary.clone()]);
        assert_eq!(params["data"], json!({"edit": 7}));
    }

    #[test]
    fn test_resolve_with_unknown_token_falls_back_untouched() {
        let fx = Fixture::new();
        let mut params = json!({"data": "lspfan-404"});
        let targets =
            fx.logic
                .servers_to_route_to("codeAction/resolve", &mut params, &fx.servers());

        assert_eq!(targets, vec![fx.primary.clone()]);
        assert_eq!(params["data"], "lspfan-404");
    }

    #[test]
    fn test_resolve_with_foreign_data_is_not_recovered() {
        let fx = Fixture::new();
        let mut params = json!({"data": {"id": 1}});
        let targets =
            fx.logic
                .servers_to_route_to("completionItem/resolve", &mut params, &fx.servers());

        assert_eq!(targets, vec![fx.primary.clone()]);
        assert_eq!(params["data"], json!({"id": 1}));
    }

    #[test]
    fn test_token_on_non_resolve_method_is_left_alone() {
        let mut fx = Fixture::new();
        let stashed = fx.logic.cookies.stash(json!(1), fx.tertiary.clone());

        let mut params = json!({"data": stashed.token.clone()});
        let targets =
            fx.logic
                .servers_to_route_to("textDocument/hover", &mut params, &fx.servers());

        assert_eq!(targets, vec![fx.primary.clone()]);
        assert_eq!(params["data"], stashed.token);
    }
}

//! Folding backend replies into a running aggregate.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::engine::LspLogic;
use crate::postprocess::attribute_diagnostics;
use crate::protocol::LspMethod;
use crate::server::ServerHandle;

impl LspLogic {
    /// Merges `payload` from `source` into `aggregate` and returns the result.
    ///
    /// Error replies never contribute. Methods without a merge rule keep the
    /// aggregate as is, so the first contribution wins.
    #[must_use]
    pub fn aggregate_payloads(
        &self,
        method: &str,
        aggregate: Value,
        payload: Value,
        source: &ServerHandle,
        is_error: bool,
    ) -> Value {
        if is_error {
            debug!(method, server = %source.name(), "Skipping error reply in aggregate");
            if let Some(metrics) = self.metrics() {
                metrics.record_error_skipped(method);
            }
            return aggregate;
        }

        trace!(method, server = %source.name(), "Aggregating reply");
        match LspMethod::parse(method) {
            LspMethod::PublishDiagnostics => merge_diagnostics(aggregate, payload, source),
            LspMethod::CodeAction => concat_lists(aggregate, payload),
            LspMethod::Initialize => self.merge_initialize(aggregate, payload, source),
            // `shutdown` results are `null`; nothing to combine.
            LspMethod::Shutdown => aggregate,
            _ => aggregate,
        }
    }
}

/// Appends `payload.diagnostics` (attributed to `source`) to
/// `aggregate.diagnostics`.
fn merge_diagnostics(mut aggregate: Value, payload: Value, source: &ServerHandle) -> Value {
    let mut incoming = match payload {
        Value::Object(mut fields) => match fields.remove("diagnostics") {
            Some(Value::Array(diagnostics)) => diagnostics,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    attribute_diagnostics(&mut incoming, source);

    if aggregate.is_null() {
        aggregate = Value::Object(Map::new());
    }
    if let Some(fields) = aggregate.as_object_mut() {
        let current = fields
            .entry("diagnostics")
            .or_insert_with(|| Value::Array(Vec::new()));
        match current {
            Value::Array(current) => current.extend(incoming),
            other => *other = Value::Array(incoming),
        }
    }
    aggregate
}

/// Concatenates two list results; anything that is not a list counts as
/// empty.
fn concat_lists(aggregate: Value, payload: Value) -> Value {
    let mut items = into_list(aggregate);
    items.extend(into_list(payload));
    Value::Array(items)
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
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
    fn test_diagnostics_append_in_arrival_order_with_attribution() {
        let (logic, primary) = engine();
        let other = ServerHandle::new("clippy");

        let aggregate = json!({
            "uri": "file:///lib.rs",
            "diagnostics": [{"message": "first", "source": "primary"}]
        });
        let payload = json!({
            "uri": "file:///lib.rs",
            "diagnostics": [{"message": "second"}, {"message": "third", "source": "rustc"}]
        });

        let merged = logic.aggregate_payloads(
            "textDocument/publishDiagnostics",
            aggregate,
            payload,
            &other,
            false,
        );

        assert_eq!(
            merged["diagnostics"],
            json!([
                {"message": "first", "source": "primary"},
                {"message": "second", "source": "clippy"},
                {"message": "third", "source": "rustc"},
            ])
        );
        assert_eq!(merged["uri"], "file:///lib.rs");
        assert_eq!(primary.name(), "primary");
    }

    #[test]
    fn test_diagnostics_into_aggregate_without_list() {
        let (logic, primary) = engine();
        let merged = logic.aggregate_payloads(
            "textDocument/publishDiagnostics",
            json!({"uri": "file:///a"}),
            json!({"diagnostics": [{"message": "m"}]}),
            &primary,
            false,
        );
        assert_eq!(merged["diagnostics"], json!([{"message": "m", "source": "primary"}]));
    }

    #[test]
    fn test_code_actions_concatenate_treating_null_as_empty() {
        let (logic, primary) = engine();

        let merged = logic.aggregate_payloads(
            "textDocument/codeAction",
            Value::Null,
            json!([{"title": "a"}]),
            &primary,
            false,
        );
        assert_eq!(merged, json!([{"title": "a"}]));

        let merged = logic.aggregate_payloads(
            "textDocument/codeAction",
            merged,
            json!([{"title": "b"}]),
            &primary,
            false,
        );
        assert_eq!(merged, json!([{"title": "a"}, {"title": "b"}]));

        let merged = logic.aggregate_payloads(
            "textDocument/codeAction",
            merged,
            Value::Null,
            &primary,
            false,
        );
        assert_eq!(merged, json!([{"title": "a"}, {"title": "b"}]));
    }

    #[test]
    fn test_error_reply_leaves_aggregate_unchanged() {
        let (logic, primary) = engine();
        let aggregate = json!([{"title": "a"}]);

        let merged = logic.aggregate_payloads(
            "textDocument/codeAction",
            aggregate.clone(),
            json!([{"title": "boom"}]),
            &primary,
            true,
        );
        assert_eq!(merged, aggregate);
    }

    #[test]
    fn test_shutdown_and_unknown_methods_keep_first_writer() {
        let (logic, primary) = engine();

        let merged = logic.aggregate_payloads("shutdown", Value::Null, Value::Null, &primary, false);
        assert_eq!(merged, Value::Null);

        let merged = logic.aggregate_payloads(
            "textDocument/hover",
            json!({"contents": "first"}),
            json!({"contents": "second"}),
            &primary,
            false,
        );
        assert_eq!(merged, json!({"contents": "first"}));
    }
}

//! Merging `initialize` results from several backends.
//!
//! The client sees one server, so it needs one capability set and one
//! `serverInfo`. Capabilities are combined per key with a left bias: the
//! first backend to announce a capability shapes it, later ones can only
//! enrich it. The exceptions are full document sync, which always wins,
//! and a structured value replacing a bare flag.
//!
//! # Known limitation
//!
//! A bare flag from one backend (`"hoverProvider": true`) and an options
//! object from another (`{"workDoneProgress": true}`) merge to the options
//! object. The client then sees sub-options only one backend supports.
//! Doing better needs a per-capability merge table.

use serde_json::{Map, Value, json};
use tracing::trace;

use crate::engine::LspLogic;
use crate::merge::{deep_merge, is_scalar};
use crate::protocol::{TEXT_DOCUMENT_SYNC, allows_structural_merge, is_full_sync};
use crate::server::ServerHandle;

/// Separator between backend names in the merged `serverInfo.name`.
pub const SERVER_NAME_SEPARATOR: &str = "+";

/// Separator between backend versions in the merged `serverInfo.version`.
pub const SERVER_VERSION_SEPARATOR: &str = ",";

impl LspLogic {
    /// Merges one backend's `initialize` result into the aggregate.
    pub(crate) fn merge_initialize(
        &self,
        mut aggregate: Value,
        payload: Value,
        source: &ServerHandle,
    ) -> Value {
        let Value::Object(mut payload) = payload else {
            return aggregate;
        };
        if aggregate.is_null() {
            aggregate = Value::Object(Map::new());
        }

        let from_primary = source.same_server(&self.primary);
        if let Some(result) = aggregate.as_object_mut() {
            let capabilities = match payload.remove("capabilities") {
                Some(Value::Object(capabilities)) => capabilities,
                _ => Map::new(),
            };
            merge_capabilities(result, capabilities);

            if let Some(Value::Object(info)) = payload.get("serverInfo") {
                if !info.is_empty() {
                    merge_server_info(result, info, from_primary);
                }
            }
        }
        aggregate
    }
}

/// Folds `incoming` into `result.capabilities`, creating it if needed.
fn merge_capabilities(result: &mut Map<String, Value>, incoming: Map<String, Value>) {
    let slot = result
        .entry("capabilities")
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let Some(merged) = slot.as_object_mut() else {
        return;
    };

    for (name, value) in incoming {
        merge_capability(merged, name, value);
    }
}

fn merge_capability(merged: &mut Map<String, Value>, name: String, incoming: Value) {
    let current = merged.get(&name).filter(|value| !value.is_null());

    let replace = match current {
        None => true,
        Some(_) if name == TEXT_DOCUMENT_SYNC && is_full_sync(&incoming) => true,
        Some(current) => is_scalar(current) && !is_scalar(&incoming),
    };
    if replace {
        trace!(capability = %name, "Adopting capability value");
        merged.insert(name, incoming);
        return;
    }

    if !allows_structural_merge(&name) {
        return;
    }
    if let (Some(Value::Object(current)), Value::Object(incoming)) = (merged.get_mut(&name), incoming)
    {
        deep_merge(current, incoming);
    }
}

/// Combines `serverInfo.name` and `serverInfo.version` of the aggregate
/// with those of the incoming reply.
fn merge_server_info(
    result: &mut Map<String, Value>,
    incoming: &Map<String, Value>,
    from_primary: bool,
) {
    let current = result.get("serverInfo").and_then(Value::as_object);
    let field = |info: Option<&Map<String, Value>>, key: &str| -> String {
        info.and_then(|info| info.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let name = join_info_field(
        &field(current, "name"),
        &field(Some(incoming), "name"),
        SERVER_NAME_SEPARATOR,
        from_primary,
    );
    let version = join_info_field(
        &field(current, "version"),
        &field(Some(incoming), "version"),
        SERVER_VERSION_SEPARATOR,
        from_primary,
    );

    result.insert(
        "serverInfo".to_string(),
        json!({"name": name, "version": version}),
    );
}

/// Joins two `serverInfo` fields, primary server's value first.
fn join_info_field(current: &str, incoming: &str, separator: &str, from_primary: bool) -> String {
    if current.is_empty() || incoming.is_empty() {
        let chosen = if incoming.is_empty() { current } else { incoming };
        return chosen.to_string();
    }

    if from_primary {
        format!("{incoming}{separator}{current}")
    } else {
        format!("{current}{separator}{incoming}")
    }
}

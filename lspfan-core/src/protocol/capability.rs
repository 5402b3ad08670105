//! Server capability names and predicates over capability values.
//!
//! Capabilities arrive as raw JSON in the `initialize` result. They are kept
//! as `serde_json` values rather than typed structs because backends
//! regularly announce fields this engine does not know about, and those
//! must survive the merge untouched.

use serde_json::{Map, Value};

// ============================================================================
// Capability Names
// ============================================================================

/// `codeActionProvider`: gates fan-out of `textDocument/codeAction`.
pub const CODE_ACTION_PROVIDER: &str = "codeActionProvider";

/// `renameProvider`
pub const RENAME_PROVIDER: &str = "renameProvider";

/// `documentFormattingProvider`
pub const DOCUMENT_FORMATTING_PROVIDER: &str = "documentFormattingProvider";

/// `documentRangeFormattingProvider`
pub const DOCUMENT_RANGE_FORMATTING_PROVIDER: &str = "documentRangeFormattingProvider";

/// `textDocumentSync`: full-sync announcements are never downgraded.
pub const TEXT_DOCUMENT_SYNC: &str = "textDocumentSync";

/// `semanticTokensProvider`
pub const SEMANTIC_TOKENS_PROVIDER: &str = "semanticTokensProvider";

/// `TextDocumentSyncKind.Full`
pub const SYNC_KIND_FULL: i64 = 1;

/// Capabilities whose structured values cannot be combined key-by-key.
///
/// Two semantic token legends index into different token type tables, so a
/// merged legend would be meaningless to every backend.
pub const STRUCTURAL_MERGE_EXCLUDED: &[&str] = &[SEMANTIC_TOKENS_PROVIDER];

// ============================================================================
// Predicates
// ============================================================================

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
///
/// Capability flags are announced as anything from `true` to a full options
/// object, so routing checks presence this way rather than `as_bool()`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether a capability map announces `name` with a truthy value.
#[must_use]
pub fn has_capability(capabilities: &Map<String, Value>, name: &str) -> bool {
    capabilities.get(name).is_some_and(is_truthy)
}

/// Whether a `textDocumentSync` value requests full-document sync.
///
/// Accepts both the bare `TextDocumentSyncKind` form (`1`) and the options
/// form (`{"change": 1, ...}`).
#[must_use]
pub fn is_full_sync(value: &Value) -> bool {
    match value {
        Value::Object(options) => options
            .get("change")
            .and_then(Value::as_i64)
            .is_some_and(|kind| kind == SYNC_KIND_FULL),
        other => other.as_i64() == Some(SYNC_KIND_FULL),
    }
}

/// Whether `capability` may be deep-merged across backends.
#[must_use]
pub fn allows_structural_merge(capability: &str) -> bool {
    !STRUCTURAL_MERGE_EXCLUDED.contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([1])));
        assert!(is_truthy(&json!({"resolveProvider": false})));
    }

    #[test]
    fn test_has_capability() {
        let caps = json!({
            "codeActionProvider": {"resolveProvider": true},
            "renameProvider": false,
        });
        let caps = caps.as_object().unwrap();

        assert!(has_capability(caps, CODE_ACTION_PROVIDER));
        assert!(!has_capability(caps, RENAME_PROVIDER));
        assert!(!has_capability(caps, DOCUMENT_FORMATTING_PROVIDER));
    }

    #[test]
    fn test_full_sync_detection() {
        assert!(is_full_sync(&json!(1)));
        assert!(is_full_sync(&json!({"openClose": true, "change": 1})));

        assert!(!is_full_sync(&json!(2)));
        assert!(!is_full_sync(&json!(0)));
        assert!(!is_full_sync(&json!({"change": 2})));
        assert!(!is_full_sync(&json!({"openClose": true})));
        assert!(!is_full_sync(&json!("1")));
    }

    #[test]
    fn test_structural_merge_exclusions() {
        assert!(!allows_structural_merge(SEMANTIC_TOKENS_PROVIDER));
        assert!(allows_structural_merge(CODE_ACTION_PROVIDER));
        assert!(allows_structural_merge("completionProvider"));
    }
}

//! LSP method classification.
//!
//! Routing, post-processing and aggregation all branch on the method name.
//! Parsing it once into [`LspMethod`] keeps those decision tables exhaustive:
//! adding a variant forces every `match` to take a position on it.

use super::capability;

/// `initialize` request.
pub const INITIALIZE: &str = "initialize";
/// `shutdown` request.
pub const SHUTDOWN: &str = "shutdown";
/// `exit` notification, sent after `shutdown`.
pub const EXIT: &str = "exit";
/// `textDocument/codeAction` request.
pub const CODE_ACTION: &str = "textDocument/codeAction";
/// `textDocument/rename` request.
pub const RENAME: &str = "textDocument/rename";
/// `textDocument/formatting` request.
pub const FORMATTING: &str = "textDocument/formatting";
/// `textDocument/rangeFormatting` request.
pub const RANGE_FORMATTING: &str = "textDocument/rangeFormatting";
/// `textDocument/didOpen` notification.
pub const DID_OPEN: &str = "textDocument/didOpen";
/// `textDocument/didChange` notification.
pub const DID_CHANGE: &str = "textDocument/didChange";
/// `textDocument/didClose` notification.
pub const DID_CLOSE: &str = "textDocument/didClose";
/// `textDocument/publishDiagnostics` notification.
pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

/// Suffix shared by all `*/resolve` requests (`codeAction/resolve`,
/// `completionItem/resolve`, ...).
pub const RESOLVE_SUFFIX: &str = "resolve";

/// A method name, classified.
///
/// Methods without special handling parse to [`LspMethod::Other`], which
/// borrows the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LspMethod<'a> {
    Initialize,
    Shutdown,
    Exit,
    CodeAction,
    Rename,
    Formatting,
    RangeFormatting,
    DidOpen,
    DidChange,
    DidClose,
    PublishDiagnostics,
    Other(&'a str),
}

impl<'a> LspMethod<'a> {
    /// Classify a method name.
    #[must_use]
    pub fn parse(method: &'a str) -> Self {
        match method {
            INITIALIZE => Self::Initialize,
            SHUTDOWN => Self::Shutdown,
            EXIT => Self::Exit,
            CODE_ACTION => Self::CodeAction,
            RENAME => Self::Rename,
            FORMATTING => Self::Formatting,
            RANGE_FORMATTING => Self::RangeFormatting,
            DID_OPEN => Self::DidOpen,
            DID_CHANGE => Self::DidChange,
            DID_CLOSE => Self::DidClose,
            PUBLISH_DIAGNOSTICS => Self::PublishDiagnostics,
            other => Self::Other(other),
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        match *self {
            Self::Initialize => INITIALIZE,
            Self::Shutdown => SHUTDOWN,
            Self::Exit => EXIT,
            Self::CodeAction => CODE_ACTION,
            Self::Rename => RENAME,
            Self::Formatting => FORMATTING,
            Self::RangeFormatting => RANGE_FORMATTING,
            Self::DidOpen => DID_OPEN,
            Self::DidChange => DID_CHANGE,
            Self::DidClose => DID_CLOSE,
            Self::PublishDiagnostics => PUBLISH_DIAGNOSTICS,
            Self::Other(name) => name,
        }
    }

    /// Whether this is a `*/resolve` request, which may carry a stashed
    /// `data` token.
    #[must_use]
    pub fn is_resolve(&self) -> bool {
        self.as_str().ends_with(RESOLVE_SUFFIX)
    }

    /// Session handshake start/end, sent to every backend.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Initialize | Self::Shutdown)
    }

    /// Capability a backend must advertise to be the single recipient of
    /// this request.
    ///
    /// `None` for methods that are not single-target capability routes.
    #[must_use]
    pub fn required_capability(&self) -> Option<&'static str> {
        match self {
            Self::Rename => Some(capability::RENAME_PROVIDER),
            Self::Formatting => Some(capability::DOCUMENT_FORMATTING_PROVIDER),
            Self::RangeFormatting => Some(capability::DOCUMENT_RANGE_FORMATTING_PROVIDER),
            _ => None,
        }
    }
}

impl std::fmt::Display for LspMethod<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

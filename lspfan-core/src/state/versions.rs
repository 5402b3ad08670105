//! Document version table.

use std::collections::HashMap;

/// Latest document version the client has announced, per URI.
///
/// Versions are copied verbatim from `didOpen`/`didChange`. Nothing here
/// generates them. The table only informs staleness checks on later
/// server notifications and never gates requests.
#[derive(Debug, Default, Clone)]
pub struct DocumentVersions {
    versions: HashMap<String, i64>,
}

impl DocumentVersions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `version` as the latest for `uri`, overwriting any prior value.
    pub fn record(&mut self, uri: impl Into<String>, version: i64) {
        self.versions.insert(uri.into(), version);
    }

    /// Forgets `uri`. Returns the version that was tracked, if any.
    pub fn forget(&mut self, uri: &str) -> Option<i64> {
        self.versions.remove(uri)
    }

    /// Forgets every document.
    pub fn clear(&mut self) {
        self.versions.clear();
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<i64> {
        self.versions.get(uri).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

//! Cardinality limiter for metric labels.
//!
//! Method names come from the client and backends, so a misbehaving peer
//! could mint an unbounded number of label values.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Label value used once the limit is reached.
pub const OVERFLOW_LABEL: &str = "__other__";

/// Maps label values past the first `max_values` distinct ones to
/// [`OVERFLOW_LABEL`].
#[derive(Debug)]
pub struct CardinalityLimiter {
    known: Mutex<HashSet<String>>,
    max_values: usize,
}

impl CardinalityLimiter {
    pub fn new(max_values: usize) -> Self {
        Self {
            known: Mutex::new(HashSet::new()),
            max_values,
        }
    }

    /// Resolve a label value, returning [`OVERFLOW_LABEL`] if cardinality
    /// is exhausted and `value` has not been seen before.
    pub fn resolve<'a>(&self, value: &'a str) -> &'a str {
        let mut known = self.known.lock();
        if known.contains(value) {
            value
        } else if known.len() < self.max_values {
            known.insert(value.to_string());
            value
        } else {
            OVERFLOW_LABEL
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.known.lock().len()
    }
}

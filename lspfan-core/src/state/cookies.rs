//! Opaque `data` stash.
//!
//! Backends attach an arbitrary `data` value to items they return (code
//! actions, completion items) and expect it back verbatim in the matching
//! `*/resolve` request. The client cannot tell which backend produced an
//! item, so the stash swaps each `data` value for a session-unique token and
//! remembers which server it came from.
//!
//! # Bounding
//!
//! The store holds at most `capacity` records. Stashing past that evicts the
//! oldest record by insertion order. Recovery does not remove a record,
//! because clients may resolve the same item more than once.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::server::ServerHandle;

/// A stashed `data` value and the backend that produced it.
#[derive(Debug, Clone)]
pub struct DataCookie {
    pub data: Value,
    pub server: ServerHandle,
}

/// Result of [`DataCookieStore::stash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stashed {
    /// Token that replaces the original `data` value.
    pub token: String,
    /// Token of the record evicted to make room, if the store was full.
    pub evicted: Option<String>,
}

/// Bounded token → [`DataCookie`] table with a monotonic counter.
#[derive(Debug)]
pub struct DataCookieStore {
    prefix: String,
    capacity: usize,
    counter: u64,
    cookies: HashMap<String, DataCookie>,
    order: VecDeque<String>,
}

impl DataCookieStore {
    /// Creates an empty store.
    ///
    /// `capacity` is clamped to at least one record.
    #[must_use]
    pub fn new(prefix: impl Into<String>, capacity: usize) -> Self {
        Self {
            prefix: prefix.into(),
            capacity: capacity.max(1),
            counter: 0,
            cookies: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Token prefix, e.g. `lspfan-`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `candidate` looks like a token minted by this store.
    ///
    /// A matching prefix does not imply the token is still stored.
    #[must_use]
    pub fn is_token(&self, candidate: &str) -> bool {
        candidate.starts_with(&self.prefix)
    }

    /// Stores `data` on behalf of `server` and returns the new token.
    pub fn stash(&mut self, data: Value, server: ServerHandle) -> Stashed {
        let evicted = if self.cookies.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.counter += 1;
        let token = format!("{}{}", self.prefix, self.counter);
        self.cookies
            .insert(token.clone(), DataCookie { data, server });
        self.order.push_back(token.clone());

        Stashed { token, evicted }
    }

    /// Looks up a token.
    #[must_use]
    pub fn recover(&self, token: &str) -> Option<&DataCookie> {
        self.cookies.get(token)
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Drops every record. The counter keeps running so tokens stay unique.
    pub fn clear(&mut self) {
        self.cookies.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) -> Option<String> {
        while let Some(token) = self.order.pop_front() {
            if self.cookies.remove(&token).is_some() {
                return Some(token);
            }
        }
        None
    }
}

//! Backend server identity.
//!
//! A [`ServerHandle`] stands for one live backend connection for the whole
//! client session. Handles compare by identity: two backends that happen to
//! announce the same name and capabilities are still different servers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::protocol;

/// Opaque per-server attachment owned by the transport layer.
pub type ServerCookie = Arc<dyn Any + Send + Sync>;

/// One backend language server.
///
/// `name` and `capabilities` start out as whatever the host knows at spawn
/// time and are overwritten from the `initialize` reply.
pub struct Server {
    name: RwLock<String>,
    capabilities: RwLock<Map<String, Value>>,
    cookie: Mutex<Option<ServerCookie>>,
}

impl Server {
    /// Returns the current display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Overwrites the display name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// Returns a copy of the capability map.
    #[must_use]
    pub fn capabilities(&self) -> Map<String, Value> {
        self.capabilities.read().clone()
    }

    /// Replaces the capability map wholesale.
    pub fn set_capabilities(&self, capabilities: Map<String, Value>) {
        *self.capabilities.write() = capabilities;
    }

    /// Whether this server announces `capability` with a truthy value.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        protocol::has_capability(&self.capabilities.read(), capability)
    }

    /// Returns the attached cookie, if any.
    #[must_use]
    pub fn cookie(&self) -> Option<ServerCookie> {
        self.cookie.lock().clone()
    }

    /// Attaches (or clears) the transport cookie.
    pub fn set_cookie(&self, cookie: Option<ServerCookie>) {
        *self.cookie.lock() = cookie;
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("name", &*self.name.read())
            .field("capabilities", &self.capabilities.read().len())
            .field("cookie", &self.cookie.lock().is_some())
            .finish()
    }
}

/// Shared, identity-compared reference to a [`Server`].
#[derive(Clone)]
pub struct ServerHandle(Arc<Server>);

impl ServerHandle {
    /// Creates a server with the given name and no capabilities.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capabilities(name, Map::new())
    }

    /// Creates a server with a known capability map.
    #[must_use]
    pub fn with_capabilities(name: impl Into<String>, capabilities: Map<String, Value>) -> Self {
        Self(Arc::new(Server {
            name: RwLock::new(name.into()),
            capabilities: RwLock::new(capabilities),
            cookie: Mutex::new(None),
        }))
    }

    /// Whether both handles refer to the same backend.
    #[must_use]
    pub fn same_server(&self, other: &ServerHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ServerHandle {
    type Target = Server;

    fn deref(&self) -> &Server {
        &self.0
    }
}

impl PartialEq for ServerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_server(other)
    }
}

impl Eq for ServerHandle {}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

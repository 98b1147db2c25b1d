//! Live session registry
//!
//! The only process-wide bridge state: which sessions are currently
//! relaying. Sessions register after both sides are connected and
//! deregister on teardown; nothing else is shared between them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// Addresses of one live session's two peers.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// WebSocket peer address
    pub peer: SocketAddr,
    /// Backend address this session connected to
    pub backend: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionInfo>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, info: SessionInfo) {
        self.inner.write().insert(id, info);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionInfo> {
        self.inner.write().remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.inner.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

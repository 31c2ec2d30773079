//! Live websocket sessions, keyed by connection id.
//!
//! Sessions register when their actor starts and unregister when it stops. Rooms use the
//! registry as their liveness oracle and the gateway uses it to reach each connection.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use actix::Recipient;
use log::debug;

use crate::room::registry::ConnectionRegistry;
use crate::room::types::ConnectionId;
use super::messages::{CloseSession, ServerEvent};

/// How to reach one connection.
#[derive(Clone)]
pub struct SessionHandle {
    pub events: Recipient<ServerEvent>,
    pub control: Recipient<CloseSession>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, handle: SessionHandle) {
        self.write().insert(id, handle);
        debug!("[Registry] Session {} registered", id);
    }

    /// Returns false if the session was not registered.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            debug!("[Registry] Session {} unregistered", id);
        }
        removed
    }

    pub fn handle(&self, id: &ConnectionId) -> Option<SessionHandle> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    // A panic while holding the lock leaves the map itself consistent; keep serving.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, SessionHandle>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, SessionHandle>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionRegistry for SessionRegistry {
    fn is_live(&self, id: &ConnectionId) -> bool {
        self.read().contains_key(id)
    }
}

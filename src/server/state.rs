// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds the dispatcher address and the session registry, shared between the
//! HTTP/WebSocket handlers and the actor system.

use std::sync::Arc;

use actix::Addr;
use crate::server::lobby::dispatcher::SessionDispatcher;
use crate::server::registry::SessionRegistry;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the dispatcher actor (owns the rooms, routes intents).
    pub dispatcher: Addr<SessionDispatcher>,
    /// Live connections; each new session registers itself here.
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(dispatcher: Addr<SessionDispatcher>, registry: Arc<SessionRegistry>) -> Self {
        AppState {
            dispatcher,
            registry,
        }
    }
}

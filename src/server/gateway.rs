//! Delivery of room effects to websocket sessions.

use std::sync::Arc;

use log::debug;

use crate::room::outbound::Outbound;
use crate::room::types::ConnectionId;
use super::messages::{CloseSession, ServerEvent};
use super::registry::SessionRegistry;

/// Fans events out to connections. Connections that are already gone are skipped.
#[derive(Clone)]
pub struct BroadcastGateway {
    sessions: Arc<SessionRegistry>,
}

impl BroadcastGateway {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    /// Send one event to one connection.
    pub fn send_to(&self, to: &ConnectionId, event: ServerEvent) {
        match self.sessions.handle(to) {
            Some(handle) => handle.events.do_send(event),
            None => debug!("[Gateway] Dropping event for closed connection {}", to),
        }
    }

    /// Apply a batch of effects, in order.
    pub fn deliver(&self, effects: Vec<Outbound>) {
        for effect in effects {
            match effect {
                Outbound::Direct { to, event } => self.send_to(&to, event),
                Outbound::Broadcast { to, event } => {
                    for member in &to {
                        self.send_to(member, event.clone());
                    }
                }
                Outbound::Disconnect { connection } => {
                    if let Some(handle) = self.sessions.handle(&connection) {
                        handle.control.do_send(CloseSession {
                            reason: "Kicked by host".to_string(),
                        });
                    }
                }
            }
        }
    }
}

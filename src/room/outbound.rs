use crate::server::messages::ServerEvent;
use super::types::ConnectionId;

/// A side effect produced by a room transition, delivered after the transition is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// One event to one connection.
    Direct { to: ConnectionId, event: ServerEvent },
    /// One event to every listed member; the list is the membership at emission time.
    Broadcast { to: Vec<ConnectionId>, event: ServerEvent },
    /// Ask the transport to drop a connection.
    Disconnect { connection: ConnectionId },
}

impl Outbound {
    pub fn direct(to: ConnectionId, event: ServerEvent) -> Self {
        Outbound::Direct { to, event }
    }

    pub fn broadcast(to: Vec<ConnectionId>, event: ServerEvent) -> Self {
        Outbound::Broadcast { to, event }
    }

    /// Whether `connection` receives `event` through this effect.
    #[cfg(test)]
    pub fn reaches(&self, connection: &ConnectionId) -> bool {
        match self {
            Outbound::Direct { to, .. } => to == connection,
            Outbound::Broadcast { to, .. } => to.contains(connection),
            Outbound::Disconnect { .. } => false,
        }
    }

    #[cfg(test)]
    pub fn event(&self) -> Option<&ServerEvent> {
        match self {
            Outbound::Direct { event, .. } | Outbound::Broadcast { event, .. } => Some(event),
            Outbound::Disconnect { .. } => None,
        }
    }
}

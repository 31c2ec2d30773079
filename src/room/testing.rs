//! Test doubles shared by the room tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::server::messages::{ServerEvent, VoteResult};
use super::machine::RoomMachine;
use super::outbound::Outbound;
use super::registry::ConnectionRegistry;
use super::types::{Capacity, ConnectionId, Room};
use super::voting::{RandomTieBreaker, TieBreaker};

/// Registry whose live set the test controls.
#[derive(Clone, Default)]
pub struct LiveSet {
    live: Arc<Mutex<HashSet<ConnectionId>>>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh live connection.
    pub fn connect(&self) -> ConnectionId {
        let id = Uuid::new_v4();
        self.live.lock().unwrap().insert(id);
        id
    }

    pub fn drop_connection(&self, id: &ConnectionId) {
        self.live.lock().unwrap().remove(id);
    }
}

impl ConnectionRegistry for LiveSet {
    fn is_live(&self, id: &ConnectionId) -> bool {
        self.live.lock().unwrap().contains(id)
    }
}

/// Always picks the same tied index.
pub struct FixedTieBreaker(pub usize);

impl TieBreaker for FixedTieBreaker {
    fn pick(&mut self, _candidates: usize) -> usize {
        self.0
    }
}

/// A machine for a room hosted by `host` (username "host").
pub fn new_machine(live: &LiveSet, host: ConnectionId, capacity: Capacity) -> RoomMachine {
    new_machine_with(live, host, capacity, Box::new(RandomTieBreaker))
}

pub fn new_machine_with(
    live: &LiveSet,
    host: ConnectionId,
    capacity: Capacity,
    tie_breaker: Box<dyn TieBreaker>,
) -> RoomMachine {
    let room = Room::new("TEST".into(), host, "host".into(), capacity);
    RoomMachine::new(room, Arc::new(live.clone()), tie_breaker)
}

/// Events `connection` receives from a batch of effects, in order.
pub fn events_for<'a>(out: &'a [Outbound], connection: &ConnectionId) -> Vec<&'a ServerEvent> {
    out.iter()
        .filter(|o| o.reaches(connection))
        .filter_map(Outbound::event)
        .collect()
}

pub fn vote_results(out: &[Outbound]) -> Vec<&VoteResult> {
    out.iter()
        .filter_map(|o| match o.event() {
            Some(ServerEvent::VoteResult(result)) => Some(result),
            _ => None,
        })
        .collect()
}

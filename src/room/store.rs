//! Room code → room handle mapping and room lifecycle.

use std::collections::HashMap;

use log::{debug, info};
use serde_json::Value;

use crate::config::room::MAX_CODE_ATTEMPTS;
use super::code::RoomCodeGenerator;
use super::error::RoomError;
use super::types::{Capacity, ConnectionId, Room, RoomCode};

/// Owns every live room, keyed by code.
///
/// `H` is whatever represents a running room: the dispatcher stores actor addresses,
/// tests can store the `Room` itself.
pub struct RoomStore<H> {
    rooms: HashMap<RoomCode, H>,
    codes: Box<dyn RoomCodeGenerator>,
}

impl<H> RoomStore<H> {
    pub fn new(codes: Box<dyn RoomCodeGenerator>) -> Self {
        Self {
            rooms: HashMap::new(),
            codes,
        }
    }

    /// Create a room hosted by `host` and register the handle built from it.
    ///
    /// Returns a snapshot of the new room for the creator's `roomCreated` event.
    pub fn create(
        &mut self,
        host: ConnectionId,
        username: String,
        requested_capacity: Option<&Value>,
        spawn: impl FnOnce(Room) -> H,
    ) -> Result<Room, RoomError> {
        let code = self.allocate_code()?;
        let capacity = Capacity::normalize(requested_capacity);
        let room = Room::new(code.clone(), host, username, capacity);
        let handle = spawn(room.clone());
        self.rooms.insert(code.clone(), handle);
        info!(
            "[RoomStore] Room {} created by {} (capacity {})",
            code,
            host,
            capacity.get()
        );
        Ok(room)
    }

    pub fn get(&self, code: &str) -> Option<&H> {
        self.rooms.get(code)
    }

    /// Drop a room. Called once its last player is gone.
    pub fn delete(&mut self, code: &str) -> Option<H> {
        let removed = self.rooms.remove(code);
        if removed.is_some() {
            info!("[RoomStore] Room {} deleted", code);
        }
        removed
    }

    pub fn handles(&self) -> impl Iterator<Item = &H> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn allocate_code(&mut self) -> Result<RoomCode, RoomError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.codes.next();
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
            debug!("[RoomStore] Code {} already in use (attempt {})", code, attempt);
        }
        Err(RoomError::CodesExhausted(MAX_CODE_ATTEMPTS))
    }
}

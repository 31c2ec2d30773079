//! Lobby layer: websocket sessions, the dispatcher routing their intents and one actor per room.

pub mod dispatcher;
pub mod room_actor;
pub mod session;

//! Room domain: entities, the per-room state machine and the room store.
//!
//! Room logic never touches a socket or an actor address. Operations return `Outbound`
//! effects carrying the wire events from `server::messages`, which the server layer
//! delivers.

pub mod types;
pub mod error;
pub mod registry;
pub mod chat;
pub mod code;
pub mod store;
pub mod outbound;
pub mod machine;
pub mod voting;

#[cfg(test)]
pub mod testing;

//! Liveness capability consulted by the state machine before it counts members.

use super::types::ConnectionId;

/// Answers whether a connection is still open.
///
/// Implemented by the transport's session registry; rooms use it to drop members whose
/// socket is gone but whose disconnect has not reached the room yet.
pub trait ConnectionRegistry: Send + Sync {
    fn is_live(&self, id: &ConnectionId) -> bool;
}

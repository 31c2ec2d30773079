//! Room error types.

use thiserror::Error;

/// Failures of room operations. None of them is fatal: join and create failures are
/// reported to the originating connection, everything else is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    /// Kick requested by someone who is not the host.
    #[error("Only the host can do that")]
    NotAuthorized,

    #[error("No free room code after {0} attempts")]
    CodesExhausted(usize),
}

impl RoomError {
    /// Stable code sent alongside the message in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound => "ROOM_NOT_FOUND",
            RoomError::RoomFull => "ROOM_FULL",
            RoomError::NotAuthorized => "NOT_AUTHORIZED",
            RoomError::CodesExhausted(_) => "CODES_EXHAUSTED",
        }
    }
}

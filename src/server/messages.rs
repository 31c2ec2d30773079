use std::collections::BTreeMap;

use actix::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::room::error::RoomError;
use crate::room::types::{Achievement, ChatMessage, ChoiceId, Room, RoomCode};

/// Usernames per choice, in join order. May include the synthetic server voter.
pub type VotersByChoice = BTreeMap<ChoiceId, Vec<String>>;

// Client -> server
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(
    tag = "action",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientWsMessage {
    CreateRoom {
        username: String,
        /// Anything; only an allowed integer is kept.
        #[serde(default)]
        capacity: Option<Value>,
    },
    JoinRoom {
        room_code: RoomCode,
        username: String,
    },
    LeaveRoom {
        room_code: RoomCode,
    },
    StartGame {
        room_code: RoomCode,
    },
    LobbyChat {
        room_code: RoomCode,
        user: String,
        text: String,
        #[serde(default)]
        time: Value,
    },
    Ready {
        room_code: RoomCode,
        #[serde(default)]
        ready: bool,
    },
    Kick {
        room_code: RoomCode,
        /// Kept raw: an id that names no connection is just an absent target.
        target_id: String,
    },
    SkipText {
        room_code: RoomCode,
        #[serde(default)]
        username: String,
        #[serde(default)]
        current_passage: Value,
    },
    Vote {
        room_code: RoomCode,
        choice: ChoiceId,
    },
    Ping,
}

/// Final outcome of a vote round.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub choice: ChoiceId,
    pub vote_counts: BTreeMap<ChoiceId, u32>,
    pub voters_by_choice: VotersByChoice,
    /// Same id as `choice`: the winning choice names the next passage.
    pub next_passage: ChoiceId,
    pub achievement: Option<Achievement>,
}

// Server -> client
#[derive(Message, Serialize, Clone, Debug, PartialEq)]
#[rtype(result = "()")]
#[serde(
    tag = "action",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    RoomCreated {
        room_code: RoomCode,
        room: Room,
    },
    RoomJoined {
        room: Room,
    },
    LobbyChatMessage(ChatMessage),
    PlayerJoined {
        room: Room,
    },
    PlayerLeft {
        room: Room,
    },
    GameStarted {
        room: Room,
    },
    ReadyUpdate {
        ready: usize,
        total: usize,
    },
    Kicked,
    TextSkipped {
        username: String,
        current_passage: Value,
    },
    VoteUpdate {
        votes: usize,
        total: usize,
        voters_by_choice: VotersByChoice,
    },
    VoteResult(VoteResult),
    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(code: &str, message: &str) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Error event for a failed room operation, sent to the originating connection.
    pub fn room_error(err: &RoomError) -> Self {
        Self::error(err.code(), &err.to_string())
    }
}

/// Ask a session to close its socket (used when a player is kicked).
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct CloseSession {
    pub reason: String,
}

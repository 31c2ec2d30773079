use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::room::{ALLOWED_CAPACITIES, DEFAULT_CAPACITY};

/// Transport-assigned connection identifier. Only ever compared, never inspected.
pub type ConnectionId = Uuid;

/// Opaque unique key of a room.
pub type RoomCode = String;

/// A choice a player votes for. The winning choice is also the id of the next passage.
///
/// Clients may send a JSON string or number; both are kept in textual form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawChoice")]
pub struct ChoiceId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChoice {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawChoice> for ChoiceId {
    fn from(raw: RawChoice) -> Self {
        match raw {
            RawChoice::Text(s) => ChoiceId(s),
            RawChoice::Number(n) => ChoiceId(n.to_string()),
        }
    }
}

impl From<&str> for ChoiceId {
    fn from(s: &str) -> Self {
        ChoiceId(s.to_string())
    }
}

impl ChoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maximum number of players a room accepts. Always one of `ALLOWED_CAPACITIES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Capacity(u8);

impl Capacity {
    /// Keep the requested capacity if it is an allowed integer, otherwise use the default.
    pub fn normalize(requested: Option<&Value>) -> Self {
        requested
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .filter(|n| ALLOWED_CAPACITIES.contains(n))
            .map(Capacity)
            .unwrap_or_default()
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity(DEFAULT_CAPACITY)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: ConnectionId,
    pub username: String,
    pub is_host: bool,
}

/// One lobby chat line. `time` is whatever the client sent and is echoed verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
    #[serde(default)]
    pub time: Value,
}

/// Signal attached to a vote result when a room reaches its unanimity streak.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub key: String,
    pub label: String,
}

/// A room and everything the clients see of it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    /// Join order. The first entry is the creator unless they left.
    pub players: Vec<Player>,
    pub current_passage: u64,
    /// Votes of the open round, keyed by voter.
    pub votes: HashMap<ConnectionId, ChoiceId>,
    #[serde(rename = "ready")]
    pub readiness: HashMap<ConnectionId, bool>,
    pub capacity: Capacity,
    #[serde(rename = "gameStarted")]
    pub started: bool,
    pub unanimous_streak: u32,
}

impl Room {
    /// A fresh room whose only player is its host.
    pub fn new(code: RoomCode, host: ConnectionId, username: String, capacity: Capacity) -> Self {
        Self {
            code,
            players: vec![Player {
                id: host,
                username,
                is_host: true,
            }],
            current_passage: 0,
            votes: HashMap::new(),
            readiness: HashMap::new(),
            capacity,
            started: false,
            unanimous_streak: 0,
        }
    }

    pub fn player(&self, id: &ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn is_member(&self, id: &ConnectionId) -> bool {
        self.player(id).is_some()
    }

    pub fn is_host(&self, id: &ConnectionId) -> bool {
        self.player(id).is_some_and(|p| p.is_host)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity.get()
    }

    /// Connection ids of every member, in join order.
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Remove a player together with its readiness and vote. Returns the removed entry.
    pub fn remove_player(&mut self, id: &ConnectionId) -> Option<Player> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        self.readiness.remove(id);
        self.votes.remove(id);
        Some(self.players.remove(index))
    }

    /// `(ready, total)` over non-host players.
    pub fn ready_counts(&self) -> (usize, usize) {
        let non_host: Vec<&Player> = self.players.iter().filter(|p| !p.is_host).collect();
        let ready = non_host
            .iter()
            .filter(|p| self.readiness.get(&p.id).copied().unwrap_or(false))
            .count();
        (ready, non_host.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn capacity_keeps_allowed_values() {
        for n in [1, 2, 3, 5] {
            assert_eq!(Capacity::normalize(Some(&json!(n))).get(), n);
        }
    }

    #[test]
    fn capacity_defaults_to_two_for_anything_else() {
        for requested in [json!(0), json!(4), json!(6), json!(-1), json!(2.5), json!("3"), json!(null), json!(300)] {
            assert_eq!(Capacity::normalize(Some(&requested)).get(), 2, "requested {requested}");
        }
        assert_eq!(Capacity::normalize(None).get(), 2);
    }

    #[test]
    fn choice_accepts_strings_and_numbers() {
        let text: ChoiceId = serde_json::from_value(json!("cave")).unwrap();
        let number: ChoiceId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(text.as_str(), "cave");
        assert_eq!(number.as_str(), "7");
        assert_eq!(serde_json::to_value(&number).unwrap(), json!("7"));
    }

    #[test]
    fn room_serializes_with_wire_field_names() {
        let host = Uuid::new_v4();
        let room = Room::new("ABCD".into(), host, "ada".into(), Capacity::default());
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["code"], "ABCD");
        assert_eq!(value["capacity"], 2);
        assert_eq!(value["gameStarted"], false);
        assert_eq!(value["currentPassage"], 0);
        assert_eq!(value["players"][0]["isHost"], true);
        assert!(value["ready"].is_object());
    }

    #[test]
    fn remove_player_clears_vote_and_readiness() {
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let mut room = Room::new("ABCD".into(), host, "ada".into(), Capacity::default());
        room.players.push(Player {
            id: guest,
            username: "bob".into(),
            is_host: false,
        });
        room.readiness.insert(guest, true);
        room.votes.insert(guest, "left".into());

        let removed = room.remove_player(&guest).unwrap();
        assert_eq!(removed.username, "bob");
        assert!(room.readiness.is_empty());
        assert!(room.votes.is_empty());
        assert!(room.remove_player(&guest).is_none());
    }

    #[test]
    fn ready_counts_ignore_host() {
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let mut room = Room::new("ABCD".into(), host, "ada".into(), Capacity::default());
        room.players.push(Player {
            id: guest,
            username: "bob".into(),
            is_host: false,
        });
        room.readiness.insert(host, true);
        assert_eq!(room.ready_counts(), (0, 1));
        room.readiness.insert(guest, true);
        assert_eq!(room.ready_counts(), (1, 1));
    }
}

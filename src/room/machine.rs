//! Room state machine: membership, readiness, chat and game start.
//!
//! A `RoomMachine` owns one room and is only ever driven by one task at a time (the room
//! actor). Every operation mutates the room and returns the events it produced, addressed
//! with the membership as it was at that instant; delivery happens afterwards.
//! The voting protocol lives in `voting.rs`.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::server::messages::ServerEvent;
use super::chat::ChatRing;
use super::error::RoomError;
use super::outbound::Outbound;
use super::registry::ConnectionRegistry;
use super::types::{ChatMessage, ConnectionId, Player, Room, RoomCode};
use super::voting::TieBreaker;

pub struct RoomMachine {
    pub(super) room: Room,
    chat: ChatRing,
    pub(super) registry: Arc<dyn ConnectionRegistry>,
    pub(super) tie_breaker: Box<dyn TieBreaker>,
}

impl RoomMachine {
    pub fn new(
        room: Room,
        registry: Arc<dyn ConnectionRegistry>,
        tie_breaker: Box<dyn TieBreaker>,
    ) -> Self {
        Self {
            room,
            chat: ChatRing::new(),
            registry,
            tie_breaker,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn code(&self) -> &RoomCode {
        &self.room.code
    }

    /// No players left: the room must be deleted.
    pub fn is_empty(&self) -> bool {
        self.room.is_empty()
    }

    /// Drop every player whose connection is gone, with their readiness and vote.
    /// Returns whether anyone was removed.
    pub(super) fn prune_stale(&mut self) -> bool {
        let stale: Vec<ConnectionId> = self
            .room
            .players
            .iter()
            .filter(|p| !self.registry.is_live(&p.id))
            .map(|p| p.id)
            .collect();
        for id in &stale {
            self.room.remove_player(id);
            debug!("[Room {}] Pruned stale player {}", self.room.code, id);
        }
        !stale.is_empty()
    }

    /// Prune, and tell the remaining players who is left if the roster changed.
    /// The pruned connection's own disconnect finds nothing to remove later on.
    pub(super) fn prune_and_announce(&mut self) -> Option<Outbound> {
        if !self.prune_stale() || self.room.is_empty() {
            return None;
        }
        Some(self.broadcast(ServerEvent::PlayerLeft {
            room: self.room.clone(),
        }))
    }

    /// Event to everybody currently in the room.
    pub(super) fn broadcast(&self, event: ServerEvent) -> Outbound {
        Outbound::broadcast(self.room.member_ids(), event)
    }

    /// Add a player. Capacity is checked against live members only.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        username: String,
    ) -> Result<Vec<Outbound>, RoomError> {
        let pruned = self.prune_and_announce();

        if self.room.is_member(&connection) {
            debug!("[Room {}] {} joined again, resending state", self.room.code, connection);
            let mut out: Vec<Outbound> = pruned.into_iter().collect();
            out.extend(self.welcome(connection));
            return Ok(out);
        }

        if self.room.is_full() {
            info!(
                "[Room {}] Join refused for {}: room is full ({}/{})",
                self.room.code,
                username,
                self.room.players.len(),
                self.room.capacity.get()
            );
            return Err(RoomError::RoomFull);
        }

        info!("[Room {}] {} joined", self.room.code, username);
        self.room.players.push(Player {
            id: connection,
            username,
            is_host: false,
        });

        let mut out: Vec<Outbound> = pruned.into_iter().collect();
        out.extend(self.welcome(connection));
        out.push(self.broadcast(ServerEvent::PlayerJoined {
            room: self.room.clone(),
        }));
        Ok(out)
    }

    /// `roomJoined` plus the chat history, to the joiner only.
    fn welcome(&self, connection: ConnectionId) -> Vec<Outbound> {
        let mut out = vec![Outbound::direct(
            connection,
            ServerEvent::RoomJoined {
                room: self.room.clone(),
            },
        )];
        out.extend(
            self.chat
                .replay()
                .map(|m| Outbound::direct(connection, ServerEvent::LobbyChatMessage(m.clone()))),
        );
        out
    }

    /// Explicit leave. Non-members are ignored.
    pub fn leave(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        self.remove_member(connection, "left")
    }

    /// Transport-level disconnect. Same effect as a leave.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        self.remove_member(connection, "disconnected")
    }

    /// Host removes another player. Anyone else gets `NotAuthorized`.
    pub fn kick(
        &mut self,
        requester: ConnectionId,
        target: ConnectionId,
    ) -> Result<Vec<Outbound>, RoomError> {
        if !self.room.is_host(&requester) {
            return Err(RoomError::NotAuthorized);
        }
        let Some(kicked) = self.room.remove_player(&target) else {
            debug!("[Room {}] Kick target {} is not in the room", self.room.code, target);
            return Ok(Vec::new());
        };
        info!("[Room {}] {} was kicked by the host", self.room.code, kicked.username);

        let mut out = vec![
            Outbound::direct(target, ServerEvent::Kicked),
            Outbound::Disconnect { connection: target },
        ];
        out.extend(self.after_departure());
        Ok(out)
    }

    fn remove_member(&mut self, connection: ConnectionId, how: &str) -> Vec<Outbound> {
        match self.room.remove_player(&connection) {
            Some(player) => {
                info!("[Room {}] {} {}", self.room.code, player.username, how);
                self.after_departure()
            }
            None => Vec::new(),
        }
    }

    /// Tell the rest who is left. A departure can also complete an open vote round.
    /// Stale players are pruned first so the one `playerLeft` covers them too.
    fn after_departure(&mut self) -> Vec<Outbound> {
        self.prune_stale();
        if self.room.is_empty() {
            return Vec::new();
        }
        let mut out = vec![self.broadcast(ServerEvent::PlayerLeft {
            room: self.room.clone(),
        })];
        if !self.room.votes.is_empty() {
            out.extend(self.try_resolve());
        }
        out
    }

    /// Record readiness of a non-host member and publish the counts.
    pub fn set_ready(&mut self, connection: ConnectionId, ready: bool) -> Vec<Outbound> {
        let Some(player) = self.room.player(&connection) else {
            return Vec::new();
        };
        if !player.is_host {
            self.room.readiness.insert(connection, ready);
        }
        let (ready, total) = self.room.ready_counts();
        debug!("[Room {}] Ready {}/{}", self.room.code, ready, total);
        vec![self.broadcast(ServerEvent::ReadyUpdate { ready, total })]
    }

    /// Start the playthrough. Readiness is informational only.
    pub fn start_game(&mut self) -> Vec<Outbound> {
        self.room.started = true;
        info!(
            "[Room {}] Game started with {} players",
            self.room.code,
            self.room.players.len()
        );
        vec![self.broadcast(ServerEvent::GameStarted {
            room: self.room.clone(),
        })]
    }

    pub fn post_chat(&mut self, message: ChatMessage) -> Vec<Outbound> {
        self.chat.post(message.clone());
        vec![self.broadcast(ServerEvent::LobbyChatMessage(message))]
    }

    /// Relay a text-skip notice. No state change.
    pub fn skip_text(&self, username: String, current_passage: Value) -> Vec<Outbound> {
        vec![self.broadcast(ServerEvent::TextSkipped {
            username,
            current_passage,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::testing::{events_for, new_machine, LiveSet};
    use crate::room::types::Capacity;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn join_appends_player_and_notifies() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());

        let out = machine.join(guest, "bob".into()).unwrap();

        assert_eq!(machine.room().players.len(), 2);
        assert!(!machine.room().players[1].is_host);
        assert!(matches!(out[0], Outbound::Direct { to, event: ServerEvent::RoomJoined { .. } } if to == guest));
        let host_events = events_for(&out, &host);
        assert_eq!(host_events.len(), 1);
        assert!(matches!(host_events[0], ServerEvent::PlayerJoined { .. }));
    }

    #[test]
    fn join_full_room_is_refused_until_a_slot_frees() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let late = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();

        assert_eq!(machine.join(late, "eve".into()), Err(RoomError::RoomFull));

        machine.leave(guest);
        assert!(machine.join(late, "eve".into()).is_ok());
        assert!(machine.room().is_member(&late));
    }

    #[test]
    fn join_prunes_disconnected_players_before_capacity_check() {
        let live = LiveSet::new();
        let host = live.connect();
        let ghost = live.connect();
        let late = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(ghost, "ghost".into()).unwrap();

        live.drop_connection(&ghost);
        let out = machine.join(late, "eve".into()).unwrap();

        let host_events = events_for(&out, &host);
        assert!(matches!(host_events[0], ServerEvent::PlayerLeft { room } if room.players.len() == 1));
        assert!(matches!(host_events[1], ServerEvent::PlayerJoined { room } if room.players.len() == 2));
        let names: Vec<&str> = machine.room().players.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["host", "eve"]);
    }

    #[test]
    fn join_replays_chat_only_to_the_joiner() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        for i in 0..7 {
            machine.post_chat(ChatMessage {
                user: "host".into(),
                text: format!("hi {i}"),
                time: json!(i),
            });
        }

        let out = machine.join(guest, "bob".into()).unwrap();

        let replayed: Vec<String> = out
            .iter()
            .filter_map(|o| match o {
                Outbound::Direct { to, event: ServerEvent::LobbyChatMessage(m) } if *to == guest => {
                    Some(m.text.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(replayed, vec!["hi 2", "hi 3", "hi 4", "hi 5", "hi 6"]);
        assert!(
            events_for(&out, &host)
                .iter()
                .all(|e| !matches!(e, ServerEvent::LobbyChatMessage(_)))
        );
    }

    #[test]
    fn repeated_join_does_not_duplicate_member() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::normalize(Some(&json!(3))));
        machine.join(guest, "bob".into()).unwrap();

        let out = machine.join(guest, "bob".into()).unwrap();

        assert_eq!(machine.room().players.len(), 2);
        assert!(out.iter().all(|o| matches!(o, Outbound::Direct { .. })));
    }

    #[test]
    fn last_leave_empties_room_without_broadcast() {
        let live = LiveSet::new();
        let host = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());

        let out = machine.leave(host);

        assert!(out.is_empty());
        assert!(machine.is_empty());
    }

    #[test]
    fn leave_by_stranger_is_ignored() {
        let live = LiveSet::new();
        let host = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());

        assert!(machine.leave(Uuid::new_v4()).is_empty());
        assert_eq!(machine.room().players.len(), 1);
    }

    #[test]
    fn disconnect_broadcasts_player_left_to_the_rest() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();
        machine.set_ready(guest, true);

        live.drop_connection(&guest);
        let out = machine.disconnect(guest);

        assert!(machine.room().readiness.is_empty());
        assert_eq!(out.len(), 1);
        assert!(out[0].reaches(&host));
        assert!(!out[0].reaches(&guest));
        assert!(matches!(out[0].event(), Some(ServerEvent::PlayerLeft { room }) if room.players.len() == 1));
    }

    #[test]
    fn pruned_player_is_announced_once() {
        let live = LiveSet::new();
        let host = live.connect();
        let a = live.connect();
        let b = live.connect();
        let mut machine = new_machine(&live, host, Capacity::normalize(Some(&json!(3))));
        machine.join(a, "a".into()).unwrap();
        machine.join(b, "b".into()).unwrap();

        live.drop_connection(&b);
        let out = machine.submit_vote(host, "x".into());

        let host_events = events_for(&out, &host);
        assert!(matches!(
            host_events[0],
            ServerEvent::PlayerLeft { room } if room.players.len() == 2 && !room.is_member(&b)
        ));
        assert!(matches!(host_events[1], ServerEvent::VoteUpdate { votes: 1, total: 2, .. }));
        assert!(events_for(&out, &b).is_empty());

        // The late disconnect has nothing left to announce.
        assert!(machine.disconnect(b).is_empty());
        let names: Vec<&str> = machine.room().players.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["host", "a"]);
    }

    #[test]
    fn departure_announcement_covers_stale_players() {
        let live = LiveSet::new();
        let host = live.connect();
        let a = live.connect();
        let b = live.connect();
        let mut machine = new_machine(&live, host, Capacity::normalize(Some(&json!(3))));
        machine.join(a, "a".into()).unwrap();
        machine.join(b, "b".into()).unwrap();

        live.drop_connection(&b);
        let out = machine.leave(a);

        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].event(), Some(ServerEvent::PlayerLeft { room }) if room.players.len() == 1));
        assert!(machine.disconnect(b).is_empty());
    }

    #[test]
    fn host_departure_does_not_promote_anyone() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();

        machine.leave(host);

        assert_eq!(machine.room().players.len(), 1);
        assert!(machine.room().players.iter().all(|p| !p.is_host));
    }

    #[test]
    fn host_kick_removes_target_and_disconnects_it() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();
        machine.set_ready(guest, true);

        let out = machine.kick(host, guest).unwrap();

        assert!(!machine.room().is_member(&guest));
        assert!(machine.room().readiness.is_empty());
        assert_eq!(events_for(&out, &guest), vec![&ServerEvent::Kicked]);
        assert!(out.contains(&Outbound::Disconnect { connection: guest }));
        let host_events = events_for(&out, &host);
        assert!(matches!(host_events[..], [ServerEvent::PlayerLeft { .. }]));
    }

    #[test]
    fn kick_by_non_host_has_no_effect() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();

        assert_eq!(machine.kick(guest, host), Err(RoomError::NotAuthorized));
        assert_eq!(machine.room().players.len(), 2);
    }

    #[test]
    fn kick_of_absent_target_is_ignored() {
        let live = LiveSet::new();
        let host = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());

        assert_eq!(machine.kick(host, Uuid::new_v4()), Ok(Vec::new()));
    }

    #[test]
    fn ready_counts_exclude_host() {
        let live = LiveSet::new();
        let host = live.connect();
        let a = live.connect();
        let b = live.connect();
        let mut machine = new_machine(&live, host, Capacity::normalize(Some(&json!(3))));
        machine.join(a, "a".into()).unwrap();
        machine.join(b, "b".into()).unwrap();

        let out = machine.set_ready(host, true);
        assert_eq!(out[0].event(), Some(&ServerEvent::ReadyUpdate { ready: 0, total: 2 }));
        assert!(!machine.room().readiness.contains_key(&host));

        let out = machine.set_ready(a, true);
        assert_eq!(out[0].event(), Some(&ServerEvent::ReadyUpdate { ready: 1, total: 2 }));

        let out = machine.set_ready(a, false);
        assert_eq!(out[0].event(), Some(&ServerEvent::ReadyUpdate { ready: 0, total: 2 }));
    }

    #[test]
    fn start_game_needs_no_readiness() {
        let live = LiveSet::new();
        let host = live.connect();
        let guest = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        machine.join(guest, "bob".into()).unwrap();

        let out = machine.start_game();

        assert!(machine.room().started);
        assert!(out[0].reaches(&host) && out[0].reaches(&guest));
        assert!(matches!(out[0].event(), Some(ServerEvent::GameStarted { room }) if room.started));
    }

    #[test]
    fn skip_text_is_a_pass_through() {
        let live = LiveSet::new();
        let host = live.connect();
        let mut machine = new_machine(&live, host, Capacity::default());
        let before = machine.room().clone();

        let out = machine.skip_text("host".into(), json!(4));

        assert_eq!(machine.room(), &before);
        assert_eq!(
            out[0].event(),
            Some(&ServerEvent::TextSkipped {
                username: "host".into(),
                current_passage: json!(4)
            })
        );
    }
}

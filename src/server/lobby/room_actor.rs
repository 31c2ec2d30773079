//! One actor per room. Its mailbox is the room's command queue, so every mutation of a
//! room is applied strictly one after another while other rooms run on their own arbiters.

use actix::prelude::*;
use log::{debug, info};
use serde_json::Value;

use crate::room::error::RoomError;
use crate::room::machine::RoomMachine;
use crate::room::types::{ChatMessage, ChoiceId, ConnectionId, Room, RoomCode};
use crate::server::gateway::BroadcastGateway;
use crate::server::messages::ServerEvent;

/// What a connection asks of a room.
#[derive(Debug, Clone)]
pub enum RoomAction {
    Join { username: String },
    Leave,
    StartGame,
    Chat(ChatMessage),
    SetReady(bool),
    Kick { target: ConnectionId },
    SkipText { username: String, current_passage: Value },
    Vote(ChoiceId),
    Disconnect,
}

/// Message: apply an action on behalf of a connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RoomCommand {
    pub connection: ConnectionId,
    pub action: RoomAction,
}

/// Message: current room state, `None` once the room has closed.
#[derive(Message)]
#[rtype(result = "Option<Room>")]
pub struct Snapshot;

/// Message: a room lost its last player and must be dropped from the store.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RoomClosed {
    pub code: RoomCode,
}

pub struct RoomActor {
    machine: RoomMachine,
    gateway: BroadcastGateway,
    on_close: Recipient<RoomClosed>,
    closed: bool,
}

impl RoomActor {
    pub fn new(machine: RoomMachine, gateway: BroadcastGateway, on_close: Recipient<RoomClosed>) -> Self {
        Self {
            machine,
            gateway,
            on_close,
            closed: false,
        }
    }

    fn apply(&mut self, connection: ConnectionId, action: RoomAction) -> Result<(), RoomError> {
        let effects = match action {
            RoomAction::Join { username } => self.machine.join(connection, username)?,
            RoomAction::Leave => self.machine.leave(connection),
            RoomAction::Disconnect => self.machine.disconnect(connection),
            RoomAction::StartGame => self.machine.start_game(),
            RoomAction::Chat(message) => self.machine.post_chat(message),
            RoomAction::SetReady(ready) => self.machine.set_ready(connection, ready),
            RoomAction::Kick { target } => self.machine.kick(connection, target)?,
            RoomAction::SkipText {
                username,
                current_passage,
            } => self.machine.skip_text(username, current_passage),
            RoomAction::Vote(choice) => self.machine.submit_vote(connection, choice),
        };
        self.gateway.deliver(effects);
        Ok(())
    }
}

impl Actor for RoomActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        debug!("[RoomActor] Room {} running", self.machine.code());
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("[RoomActor] Room {} stopped", self.machine.code());
    }
}

impl Handler<RoomCommand> for RoomActor {
    type Result = ();

    fn handle(&mut self, msg: RoomCommand, _ctx: &mut Self::Context) -> Self::Result {
        if self.closed {
            // The room emptied while this command was queued.
            if matches!(msg.action, RoomAction::Join { .. }) {
                self.gateway
                    .send_to(&msg.connection, ServerEvent::room_error(&RoomError::RoomNotFound));
            }
            return;
        }

        let is_join = matches!(msg.action, RoomAction::Join { .. });
        if let Err(err) = self.apply(msg.connection, msg.action) {
            if is_join {
                self.gateway.send_to(&msg.connection, ServerEvent::room_error(&err));
            } else {
                debug!(
                    "[RoomActor] Room {}: ignored request from {}: {}",
                    self.machine.code(),
                    msg.connection,
                    err
                );
            }
        }

        if self.machine.is_empty() {
            self.closed = true;
            info!("[RoomActor] Room {} is empty, closing", self.machine.code());
            self.on_close.do_send(RoomClosed {
                code: self.machine.code().clone(),
            });
        }
    }
}

impl Handler<Snapshot> for RoomActor {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult((!self.closed).then(|| self.machine.room().clone()))
    }
}

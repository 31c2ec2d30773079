//! Session dispatcher actor.
//!
//! Owns the room store, creates rooms and routes every client intent to the actor of the
//! room it targets. It only looks rooms up and forwards; room logic never runs here.

use std::sync::Arc;

use actix::prelude::*;
use actix::{Arbiter, ArbiterHandle};
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::room::code::RoomCodeGenerator;
use crate::room::error::RoomError;
use crate::room::machine::RoomMachine;
use crate::room::registry::ConnectionRegistry;
use crate::room::store::RoomStore;
use crate::room::types::{ChatMessage, ConnectionId, Room, RoomCode};
use crate::room::voting::RandomTieBreaker;
use crate::server::gateway::BroadcastGateway;
use crate::server::messages::{ClientWsMessage, ServerEvent};
use crate::server::registry::SessionRegistry;
use super::room_actor::{RoomAction, RoomActor, RoomClosed, RoomCommand, Snapshot};

pub struct SessionDispatcher {
    rooms: RoomStore<Addr<RoomActor>>,
    registry: Arc<SessionRegistry>,
    gateway: BroadcastGateway,
    /// Arbiters room actors are spread over. Empty means "the current one".
    workers: Vec<ArbiterHandle>,
    next_worker: usize,
}

impl SessionDispatcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        codes: Box<dyn RoomCodeGenerator>,
        workers: Vec<ArbiterHandle>,
    ) -> Self {
        Self {
            rooms: RoomStore::new(codes),
            gateway: BroadcastGateway::new(registry.clone()),
            registry,
            workers,
            next_worker: 0,
        }
    }

    /// Round-robin over the worker arbiters.
    fn next_worker(&mut self) -> ArbiterHandle {
        if self.workers.is_empty() {
            return Arbiter::current();
        }
        let worker = self.workers[self.next_worker % self.workers.len()].clone();
        self.next_worker = self.next_worker.wrapping_add(1);
        worker
    }

    fn create_room(
        &mut self,
        connection: ConnectionId,
        username: String,
        capacity: Option<Value>,
        ctx: &mut Context<Self>,
    ) {
        let worker = self.next_worker();
        let registry: Arc<dyn ConnectionRegistry> = self.registry.clone();
        let gateway = self.gateway.clone();
        let on_close = ctx.address().recipient();

        let created = self.rooms.create(connection, username, capacity.as_ref(), move |room| {
            let machine = RoomMachine::new(room, registry, Box::new(RandomTieBreaker));
            RoomActor::start_in_arbiter(&worker, move |_| RoomActor::new(machine, gateway, on_close))
        });

        match created {
            Ok(room) => {
                info!("[Dispatcher] Room {} created ({} open)", room.code, self.rooms.len());
                self.gateway.send_to(
                    &connection,
                    ServerEvent::RoomCreated {
                        room_code: room.code.clone(),
                        room,
                    },
                );
            }
            Err(err) => {
                warn!("[Dispatcher] Could not create room for {}: {}", connection, err);
                self.gateway.send_to(&connection, ServerEvent::room_error(&err));
            }
        }
    }

    fn join_room(&self, connection: ConnectionId, code: &str, username: String) {
        match self.rooms.get(code) {
            Some(addr) => addr.do_send(RoomCommand {
                connection,
                action: RoomAction::Join { username },
            }),
            None => {
                debug!("[Dispatcher] {} tried to join unknown room {}", connection, code);
                self.gateway
                    .send_to(&connection, ServerEvent::room_error(&RoomError::RoomNotFound));
            }
        }
    }

    /// Hand an action to the room's actor. Unknown rooms are ignored.
    fn forward(&self, code: &str, connection: ConnectionId, action: RoomAction) {
        match self.rooms.get(code) {
            Some(addr) => addr.do_send(RoomCommand { connection, action }),
            None => debug!("[Dispatcher] Ignoring {:?} for unknown room {}", action, code),
        }
    }
}

impl Actor for SessionDispatcher {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(
            "[Dispatcher] Started with {} room worker(s)",
            self.workers.len().max(1)
        );
    }
}

/// Message: an intent received from a connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Dispatch {
    pub connection: ConnectionId,
    pub msg: ClientWsMessage,
}

/// Message: a connection is gone. Applied to every room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub connection: ConnectionId,
}

/// Message: read-only snapshot of a room.
#[derive(Message)]
#[rtype(result = "Option<Room>")]
pub struct GetRoom {
    pub code: RoomCode,
}

impl Handler<Dispatch> for SessionDispatcher {
    type Result = ();

    fn handle(&mut self, msg: Dispatch, ctx: &mut Self::Context) -> Self::Result {
        let connection = msg.connection;
        match msg.msg {
            ClientWsMessage::CreateRoom { username, capacity } => {
                self.create_room(connection, username, capacity, ctx)
            }
            ClientWsMessage::JoinRoom {
                room_code,
                username,
            } => self.join_room(connection, &room_code, username),
            ClientWsMessage::LeaveRoom { room_code } => {
                self.forward(&room_code, connection, RoomAction::Leave)
            }
            ClientWsMessage::StartGame { room_code } => {
                self.forward(&room_code, connection, RoomAction::StartGame)
            }
            ClientWsMessage::LobbyChat {
                room_code,
                user,
                text,
                time,
            } => self.forward(
                &room_code,
                connection,
                RoomAction::Chat(ChatMessage { user, text, time }),
            ),
            ClientWsMessage::Ready { room_code, ready } => {
                self.forward(&room_code, connection, RoomAction::SetReady(ready))
            }
            ClientWsMessage::Kick {
                room_code,
                target_id,
            } => match Uuid::parse_str(&target_id) {
                Ok(target) => self.forward(&room_code, connection, RoomAction::Kick { target }),
                Err(_) => debug!(
                    "[Dispatcher] Ignoring kick of unknown target {:?} in room {}",
                    target_id, room_code
                ),
            },
            ClientWsMessage::SkipText {
                room_code,
                username,
                current_passage,
            } => self.forward(
                &room_code,
                connection,
                RoomAction::SkipText {
                    username,
                    current_passage,
                },
            ),
            ClientWsMessage::Vote { room_code, choice } => {
                self.forward(&room_code, connection, RoomAction::Vote(choice))
            }
            ClientWsMessage::Ping => {}
        }
    }
}

impl Handler<Disconnect> for SessionDispatcher {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        // Rooms the connection is not part of ignore it.
        for addr in self.rooms.handles() {
            addr.do_send(RoomCommand {
                connection: msg.connection,
                action: RoomAction::Disconnect,
            });
        }
    }
}

impl Handler<RoomClosed> for SessionDispatcher {
    type Result = ();

    fn handle(&mut self, msg: RoomClosed, _ctx: &mut Self::Context) -> Self::Result {
        self.rooms.delete(&msg.code);
    }
}

impl Handler<GetRoom> for SessionDispatcher {
    type Result = ResponseFuture<Option<Room>>;

    fn handle(&mut self, msg: GetRoom, _ctx: &mut Self::Context) -> Self::Result {
        let addr = self.rooms.get(&msg.code).cloned();
        Box::pin(async move {
            match addr {
                Some(addr) => addr.send(Snapshot).await.ok().flatten(),
                None => None,
            }
        })
    }
}

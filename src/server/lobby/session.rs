/// WebSocket session handler for one client connection.
///
/// This actor owns a single socket: it registers the connection so rooms can see it as
/// live, relays every parsed client intent to the dispatcher, writes server events back to
/// the client and keeps the connection honest with a ping/pong heartbeat.
use std::sync::Arc;
use std::time::Instant;

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{error, info, warn};
use uuid::Uuid;

use crate::config::server::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::room::types::ConnectionId;
use crate::server::messages::{ClientWsMessage, CloseSession, ServerEvent};
use crate::server::registry::{SessionHandle, SessionRegistry};
use crate::server::ws_error::ws_error_message;
use super::dispatcher::{Disconnect, Dispatch, SessionDispatcher};

/// Represents one client's WebSocket session.
pub struct ClientSession {
    pub id: ConnectionId,
    last_heartbeat: Instant,
    dispatcher: Addr<SessionDispatcher>,
    registry: Arc<SessionRegistry>,
}

impl ClientSession {
    pub fn new(dispatcher: Addr<SessionDispatcher>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_heartbeat: Instant::now(),
            dispatcher,
            registry,
        }
    }

    /// Ping the client periodically and drop it once it stops answering.
    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!("[Session] {} timed out, disconnecting", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ClientSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when the session starts. Makes the connection visible as live.
    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        self.registry.register(
            self.id,
            SessionHandle {
                events: addr.clone().recipient(),
                control: addr.recipient(),
            },
        );
        self.start_heartbeat(ctx);
        info!("[Session] {} connected ({} live)", self.id, self.registry.len());
    }

    /// Called when the session stops. The connection stops being live before the
    /// rooms hear about it, so queued votes already see it as gone.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.registry.unregister(&self.id);
        self.dispatcher.do_send(Disconnect { connection: self.id });
        info!("[Session] {} disconnected", self.id);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ClientSession {
    /// Handles incoming WebSocket messages from the client.
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientWsMessage>(&text) {
                    Ok(msg) => self.dispatcher.do_send(Dispatch {
                        connection: self.id,
                        msg,
                    }),
                    Err(e) => {
                        warn!("[Session] {} sent an invalid message: {}", self.id, e);
                        ctx.text(ws_error_message(
                            "INVALID_MESSAGE",
                            "Invalid client message",
                            Some(&e.to_string()),
                        ));
                    }
                }
            }
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => self.last_heartbeat = Instant::now(),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => (),
            Err(e) => {
                warn!("[Session] {} protocol error: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

impl Handler<ServerEvent> for ClientSession {
    type Result = ();

    /// Handles events sent from rooms to this session.
    fn handle(&mut self, msg: ServerEvent, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                // Serialization error: notify client and close connection.
                error!("[Session] Failed to serialize ServerEvent: {}", e);
                ctx.text(ws_error_message("INTERNAL", "Internal server error", None));
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Error,
                    description: Some("Internal server error".into()),
                }));
                ctx.stop();
            }
        }
    }
}

impl Handler<CloseSession> for ClientSession {
    type Result = ();

    fn handle(&mut self, msg: CloseSession, ctx: &mut Self::Context) {
        info!("[Session] {} closed by server: {}", self.id, msg.reason);
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Policy,
            description: Some(msg.reason),
        }));
        ctx.stop();
    }
}

/// WebSocket endpoint. Every upgrade gets a fresh connection id.
pub async fn ws_session(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    ws::start(
        ClientSession::new(data.dispatcher.clone(), data.registry.clone()),
        &req,
        stream,
    )
}

//! HTTP and WebSocket routing configuration.
//!
//! One websocket endpoint carries the whole lobby and voting protocol; the plain
//! HTTP routes are for probes and debugging.

use actix_web::web;
use crate::server::http::{health, room_snapshot};
use crate::server::lobby::session::ws_session;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").to(ws_session))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/rooms/{code}").route(web::get().to(room_snapshot)));
}

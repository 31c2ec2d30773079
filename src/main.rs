//! Main entry point for the backend server.
//!
//! Initializes logging and the actor system, spreads room actors over a pool of
//! arbiters, and launches the HTTP server with the lobby websocket endpoint.

use std::sync::Arc;

use actix::{Actor, Arbiter};
use actix_web::{web, App, HttpServer};
use log::info;

use config::room::LEGACY_ROOM_CODE;
use config::server::ServerSettings;
use room::code::{FixedCodeGenerator, RandomCodeGenerator, RoomCodeGenerator};
use server::lobby::dispatcher::SessionDispatcher;
use server::registry::SessionRegistry;

pub mod config;
mod room;
mod server;


#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from RUST_LOG (default to info level).
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ServerSettings::from_env();

    // Worker arbiters hosting room actors. Dropping an Arbiter does not stop it.
    let workers: Vec<Arbiter> = (0..settings.room_workers).map(|_| Arbiter::new()).collect();
    let handles = workers.iter().map(Arbiter::handle).collect();

    let codes: Box<dyn RoomCodeGenerator> = if settings.fixed_room_code {
        info!("[Main] Handing out the fixed room code {}", LEGACY_ROOM_CODE);
        Box::new(FixedCodeGenerator::default())
    } else {
        Box::new(RandomCodeGenerator::default())
    };

    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = SessionDispatcher::new(registry.clone(), codes, handles).start();

    // Shared application state for HTTP/WebSocket handlers.
    let state = web::Data::new(server::state::AppState::new(dispatcher, registry));

    info!("[Main] Listening on {}:{}", settings.host, settings.port);
    let result = HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await;

    for worker in &workers {
        worker.stop();
    }
    result
}

//! Plain HTTP handlers.

use actix_web::{http::StatusCode, web, HttpResponse};
use log::error;

use crate::server::lobby::dispatcher::GetRoom;
use crate::server::state::AppState;
use crate::server::ws_error::http_error_response;

/// Liveness probe.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

/// Current snapshot of a room, as members see it in `roomJoined`.
pub async fn room_snapshot(path: web::Path<String>, data: web::Data<AppState>) -> HttpResponse {
    let code = path.into_inner();
    match data.dispatcher.send(GetRoom { code: code.clone() }).await {
        Ok(Some(room)) => HttpResponse::Ok().json(room),
        Ok(None) => http_error_response(
            "ROOM_NOT_FOUND",
            "Room not found",
            Some(&code),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => {
            error!("[Http] Dispatcher unavailable: {}", e);
            http_error_response(
                "INTERNAL",
                "Internal server error",
                None,
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

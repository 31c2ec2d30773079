/// Centralized helpers for WebSocket and HTTP error payloads.
///
/// Every error carries a code and a message, plus an optional context string.
use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;

/// Formats a WebSocket error event as a JSON string, shaped like every other server event.
///
/// # Arguments
/// - `code`: Unique error code (e.g. "INVALID_MESSAGE").
/// - `message`: Human-readable error message.
/// - `context`: Optional context (e.g. the parser's complaint, a room code).
pub fn ws_error_message(code: &str, message: &str, context: Option<&str>) -> String {
    json!({
        "action": "error",
        "data": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(""),
        }
    })
    .to_string()
}

/// Returns an HTTP error response with a JSON body.
pub fn http_error_response(
    code: &str,
    message: &str,
    context: Option<&str>,
    status: StatusCode,
) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "error": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(""),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn ws_error_is_an_error_event() {
        let raw = ws_error_message("INVALID_MESSAGE", "Invalid client message", Some("expected `\"`"));
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["action"], "error");
        assert_eq!(parsed["data"]["code"], "INVALID_MESSAGE");
        assert_eq!(parsed["data"]["context"], "expected `\"`");
    }

    #[test]
    fn http_error_carries_status() {
        let resp = http_error_response("ROOM_NOT_FOUND", "Room not found", None, StatusCode::NOT_FOUND);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

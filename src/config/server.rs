//! Server and process configuration.
//!
//! Constants for the websocket heartbeat plus the settings read from the
//! environment at startup (bind address, room worker threads, code mode).
use std::env;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use log::warn;

/// Default interface the HTTP server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port, the one legacy clients connect to.
pub const DEFAULT_PORT: u16 = 3002;

/// How often the server pings each websocket client.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// A client silent for this long is considered disconnected.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

pub const HOST_VAR: &str = "BRANCHVOTE_HOST";
pub const PORT_VAR: &str = "BRANCHVOTE_PORT";
pub const ROOM_WORKERS_VAR: &str = "BRANCHVOTE_ROOM_WORKERS";
pub const FIXED_ROOM_CODE_VAR: &str = "BRANCHVOTE_FIXED_ROOM_CODE";

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Number of arbiter threads room actors are spread over.
    pub room_workers: usize,
    /// Hand out the single legacy room code instead of random ones.
    pub fixed_room_code: bool,
}

impl ServerSettings {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Invalid values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup(HOST_VAR)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = parse_or(lookup(PORT_VAR), PORT_VAR, DEFAULT_PORT);

        let default_workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let room_workers = parse_or(lookup(ROOM_WORKERS_VAR), ROOM_WORKERS_VAR, default_workers).max(1);

        let fixed_room_code = lookup(FIXED_ROOM_CODE_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            host,
            port,
            room_workers,
            fixed_room_code,
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("[Config] Ignoring invalid {}={:?}", key, value);
            default
        }),
        None => default,
    }
}

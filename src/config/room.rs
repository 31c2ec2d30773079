//! Room configuration constants.
//!
//! This module defines the lobby rules: accepted capacities, chat history size,
//! room code shape and the voting achievement parameters.

/// Capacities a host may request when creating a room.
pub const ALLOWED_CAPACITIES: [u8; 4] = [1, 2, 3, 5];

/// Capacity used when the requested one is absent or not allowed.
pub const DEFAULT_CAPACITY: u8 = 2;

/// Number of lobby chat messages kept per room and replayed to joiners.
pub const CHAT_HISTORY_LEN: usize = 5;

/// Characters used for generated room codes (no 0/O, 1/I look-alikes).
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated room codes.
pub const ROOM_CODE_LENGTH: usize = 4;

/// Code handed out by the legacy single-room mode.
pub const LEGACY_ROOM_CODE: &str = "1234";

/// How many times the store draws a code before giving up on a collision streak.
pub const MAX_CODE_ATTEMPTS: usize = 64;

/// Display name of the synthetic voter added when the server breaks a tie.
pub const SERVER_VOTER_LABEL: &str = "Server";

/// Consecutive unanimous rounds needed for the streak achievement.
pub const UNANIMOUS_STREAK_TARGET: u32 = 3;

/// Achievement key sent with the vote result once the streak target is reached.
pub const UNANIMOUS_ACHIEVEMENT_KEY: &str = "unanimous_3";

/// Human-readable label of the streak achievement.
pub const UNANIMOUS_ACHIEVEMENT_LABEL: &str = "Three unanimous rounds in a row";

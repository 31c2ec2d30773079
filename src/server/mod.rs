// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the backend transport components, including:
//! - Application state and HTTP/WebSocket routing
//! - The session registry and the gateway delivering room effects
//! - The lobby actors (sessions, dispatcher, per-room actors)

pub mod state;
pub mod router;
pub mod http;
pub mod lobby;
pub mod messages;
pub mod registry;
pub mod gateway;
pub mod ws_error;

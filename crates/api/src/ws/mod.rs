//! WebSocket infrastructure for real-time communication.
//!
//! Provides the connection registry (room + user hubs), the chat session
//! handler, the personal event bridge, and the keepalive task.

mod bridge;
mod chat;
mod keepalive;
pub mod registry;

pub use bridge::bridge_ws_handler;
pub use chat::chat_ws_handler;
pub use keepalive::start_keepalive;
pub use registry::{RoomHub, UserHub};

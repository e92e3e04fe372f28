//! Reusable reconnecting WebSocket client

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsEvent};

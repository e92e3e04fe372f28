//! Session control module
//!
//! Window scheduling, shared budget, and the bot driving detectors

mod bot;
mod budget;
mod window;

pub use bot::MovementBot;
pub use budget::{SessionBudget, MIN_ORDER_USD};
pub use window::{MonitorWindow, ACTIVE_POLL_INTERVAL};

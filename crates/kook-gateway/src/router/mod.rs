//! Event routing
//!
//! Delivers accepted events from the receive loop to the bot.

mod dispatcher;
mod handler;

pub use dispatcher::{EventRouter, DEFAULT_QUEUE_CAPACITY};
pub use handler::{log_message, log_system_event, EventHandler};

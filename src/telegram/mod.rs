//! Telegram bot integration and handlers

pub mod bot;
pub mod flow;
pub mod handlers;
pub mod transport;

/// Bot type used throughout the crate
pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use flow::{Event, Flow, FlowConfig, PhotoSelection};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use transport::{ChoiceButton, TelegramTransport, Transport};

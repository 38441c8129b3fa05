//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers only translate updates into flow events, so the interaction logic can be tested
//! without a Telegram connection.

mod schema;
mod types;

pub use schema::{event_from_message, schema};
pub use types::{HandlerDeps, HandlerError, Sender};

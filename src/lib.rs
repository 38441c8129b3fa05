//! Rethumb - Telegram bot that sends documents back with a custom thumbnail
//!
//! Users store one thumbnail photo, then send any document; the bot offers to rename it and
//! re-uploads it with the thumbnail attached.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, session state and shared types
//! - `storage`: persistent user → thumbnail mapping
//! - `download`: document re-upload pipeline
//! - `telegram`: bot setup, dispatcher schema, transport and the interaction flow

pub mod cli;
pub mod core;
pub mod download;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError};
pub use download::ReuploadPipeline;
pub use storage::ThumbnailStore;
pub use telegram::{Flow, FlowConfig};

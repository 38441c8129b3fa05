//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod recorder;

#[allow(unused_imports)]
pub use fixtures::{dir_entries, document, photo_sizes, TestBot, CHAT, USER};
#[allow(unused_imports)]
pub use recorder::{body_of, Call, RecordingTransport};

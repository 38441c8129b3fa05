//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::{ChatId, Message, UserId};

use crate::telegram::flow::Flow;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub flow: Arc<Flow>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(flow: Arc<Flow>) -> Self {
        Self { flow }
    }
}

/// Who sent a message and where to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    pub user: UserId,
    pub chat: ChatId,
}

impl Sender {
    /// Sender of a private, non-bot message
    pub fn from_message(msg: &Message) -> Option<Self> {
        if !msg.chat.is_private() {
            return None;
        }
        let user = msg.from.as_ref().filter(|user| !user.is_bot)?;
        Some(Self {
            user: user.id,
            chat: msg.chat.id,
        })
    }
}

//! Per-user pending flow state
//!
//! Each user owns one slot behind a tokio mutex. Handling an event means holding that user's
//! [`SessionGuard`] until the event is fully processed, so events from the same user never interleave
//! while different users proceed independently.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::types::{MessageId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::types::DocumentRef;

/// Position of a user inside a multi-step interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingOperation {
    /// No flow in progress
    #[default]
    Idle,
    /// `/set_thumbnail` was sent, next photo becomes the thumbnail
    AwaitingThumbnailPhoto,
    /// A document arrived and the Yes/No rename prompt is shown
    AwaitingRenameDecision {
        document: DocumentRef,
        /// Message carrying the Yes/No buttons
        prompt: Option<MessageId>,
    },
    /// User chose to rename, next text message is the new file name
    AwaitingNewFilename {
        document: DocumentRef,
        /// Message asking for the name, reused as the upload status message
        prompt: Option<MessageId>,
    },
}

impl PendingOperation {
    pub fn is_idle(&self) -> bool {
        matches!(self, PendingOperation::Idle)
    }

    /// Document stashed by the rename flow, if any
    pub fn document(&self) -> Option<&DocumentRef> {
        match self {
            PendingOperation::AwaitingRenameDecision { document, .. }
            | PendingOperation::AwaitingNewFilename { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            PendingOperation::Idle => "idle",
            PendingOperation::AwaitingThumbnailPhoto => "awaiting_thumbnail_photo",
            PendingOperation::AwaitingRenameDecision { .. } => "awaiting_rename_decision",
            PendingOperation::AwaitingNewFilename { .. } => "awaiting_new_filename",
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    operation: PendingOperation,
    since: Option<Instant>,
}

/// In-memory store of pending flows keyed by user id.
///
/// Lost on restart; that is acceptable for short-lived interactive flows.
pub struct SessionStore {
    slots: DashMap<UserId, Arc<Mutex<Slot>>>,
    timeout: Option<Duration>,
}

impl SessionStore {
    /// Creates a store whose unfinished flows expire after `timeout` (`None` keeps them forever).
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    /// Waits for exclusive access to the user's session.
    ///
    /// A flow older than the configured timeout is dropped here and reported through
    /// [`SessionGuard::expired`].
    pub async fn lock(&self, user: UserId) -> SessionGuard {
        let slot = Arc::clone(self.slots.entry(user).or_default().value());
        let mut slot = slot.lock_owned().await;

        let expired = match (self.timeout, slot.since) {
            (Some(timeout), Some(since)) if since.elapsed() >= timeout => {
                let stale = std::mem::take(&mut slot.operation);
                slot.since = None;
                log::info!(
                    "Session for user {} expired after {:?} in state {}",
                    user,
                    timeout,
                    stale.name()
                );
                Some(stale)
            }
            _ => None,
        };

        SessionGuard { user, slot, expired }
    }

    /// Snapshot of the user's current operation (waits for in-flight handling to finish).
    pub async fn current(&self, user: UserId) -> PendingOperation {
        let operation = self.lock(user).await.operation().clone();
        self.release(user);
        operation
    }

    /// Drops the user's slot if it is idle and nobody holds or waits for it.
    ///
    /// Call after the guard is dropped. `lock` clones the slot while holding the map shard, so the
    /// reference count seen here cannot race with a new waiter.
    pub fn release(&self, user: UserId) {
        self.slots.remove_if(&user, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|slot| slot.operation.is_idle())
        });
    }

    /// Number of users with a pending flow or an event in progress
    pub fn active_users(&self) -> usize {
        self.slots.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Exclusive handle on one user's session, released on drop.
pub struct SessionGuard {
    user: UserId,
    slot: OwnedMutexGuard<Slot>,
    expired: Option<PendingOperation>,
}

impl SessionGuard {
    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn operation(&self) -> &PendingOperation {
        &self.slot.operation
    }

    pub fn is_idle(&self) -> bool {
        self.slot.operation.is_idle()
    }

    /// Flow that timed out just before this guard was taken
    pub fn expired(&self) -> Option<&PendingOperation> {
        self.expired.as_ref()
    }

    /// Enters a new state, replacing whatever was pending.
    pub fn begin(&mut self, operation: PendingOperation) {
        if !self.slot.operation.is_idle() {
            log::debug!(
                "User {}: replacing {} with {}",
                self.user,
                self.slot.operation.name(),
                operation.name()
            );
        }
        self.slot.since = (!operation.is_idle()).then(Instant::now);
        self.slot.operation = operation;
    }

    /// Takes the pending operation out, leaving the session idle.
    pub fn take(&mut self) -> PendingOperation {
        self.slot.since = None;
        std::mem::take(&mut self.slot.operation)
    }

    pub fn clear(&mut self) {
        self.take();
    }
}

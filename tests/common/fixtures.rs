//! Test fixtures: a fully wired flow on top of the recording transport

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use teloxide::types::{ChatId, MessageId, UserId};

use rethumb::core::session::{PendingOperation, SessionStore};
use rethumb::core::types::{DocumentRef, PhotoVariant, ThumbnailRef};
use rethumb::download::ReuploadPipeline;
use rethumb::storage::ThumbnailStore;
use rethumb::telegram::bot::Command;
use rethumb::telegram::flow::{Event, Flow, FlowConfig};

use super::recorder::RecordingTransport;

pub const USER: UserId = UserId(42);
pub const CHAT: ChatId = ChatId(42);

/// Flow, stores and transport sharing one temporary directory
pub struct TestBot {
    pub dir: TempDir,
    pub transport: Arc<RecordingTransport>,
    pub flow: Arc<Flow>,
}

impl TestBot {
    pub async fn new() -> Self {
        Self::with_config(FlowConfig::default(), None).await
    }

    pub async fn with_config(config: FlowConfig, session_timeout: Option<Duration>) -> Self {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let thumbnails = Arc::new(ThumbnailStore::load(dir.path().join("thumbnails.json")).await.unwrap());
        let sessions = Arc::new(SessionStore::new(session_timeout));
        let pipeline = ReuploadPipeline::new(transport.clone(), dir.path().join("tmp"));
        let flow = Arc::new(Flow::new(transport.clone(), thumbnails, sessions, pipeline, config));

        Self { dir, transport, flow }
    }

    /// Same as `new`, with a thumbnail already stored for [`USER`]
    pub async fn with_thumbnail(thumbnail: &str) -> Self {
        let bot = Self::new().await;
        bot.flow.thumbnails().set(USER, ThumbnailRef::new(thumbnail)).await.unwrap();
        bot
    }

    pub fn temp_root(&self) -> std::path::PathBuf {
        self.dir.path().join("tmp")
    }

    pub fn thumbnails_path(&self) -> std::path::PathBuf {
        self.dir.path().join("thumbnails.json")
    }

    pub async fn send(&self, event: Event) {
        self.flow.handle(USER, CHAT, event).await;
    }

    pub async fn command(&self, command: Command) {
        self.send(Event::Command(command)).await;
    }

    pub async fn text(&self, text: &str) {
        self.send(Event::Text(text.to_string())).await;
    }

    /// Presses a button on the most recent prompt
    pub async fn press(&self, payload: &str) {
        let message = self.transport.last_prompt();
        self.press_on(payload, message).await;
    }

    pub async fn press_on(&self, payload: &str, message: Option<MessageId>) {
        self.send(Event::Button {
            payload: payload.to_string(),
            message,
        })
        .await;
    }

    pub async fn state(&self) -> PendingOperation {
        self.flow.sessions().current(USER).await
    }
}

pub fn document(file_id: &str, name: &str, size: u64) -> DocumentRef {
    DocumentRef::new(file_id, Some(name.to_string()), size)
}

/// Three sizes of one photo as Telegram delivers them
pub fn photo_sizes() -> Vec<PhotoVariant> {
    vec![
        PhotoVariant {
            file_id: "photo-s".into(),
            width: 90,
            height: 60,
            file_size: 1_500,
        },
        PhotoVariant {
            file_id: "photo-m".into(),
            width: 320,
            height: 213,
            file_size: 14_000,
        },
        PhotoVariant {
            file_id: "photo-x".into(),
            width: 1280,
            height: 853,
            file_size: 98_000,
        },
    ]
}

/// Entries left in a directory (a missing directory counts as empty)
pub fn dir_entries(path: &Path) -> usize {
    std::fs::read_dir(path).map(|entries| entries.count()).unwrap_or(0)
}

//! In-memory transport that records every outbound call
//!
//! Downloads write a small deterministic body to the requested path, so the re-upload pipeline runs
//! against real files in a temporary directory. Failures can be scripted per file id.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;
use teloxide::types::{ChatId, MessageId};

use rethumb::core::error::TransportError;
use rethumb::core::types::ThumbnailRef;
use rethumb::telegram::transport::{ChoiceButton, Transport};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Text {
        chat: ChatId,
        text: String,
        id: MessageId,
    },
    Buttons {
        chat: ChatId,
        text: String,
        payloads: Vec<String>,
        id: MessageId,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
    },
    Photo {
        chat: ChatId,
        file_id: String,
    },
    Download {
        file_id: String,
    },
    Document {
        chat: ChatId,
        filename: String,
        body: String,
        thumbnail: bool,
        /// Directory the uploaded file lived in
        workdir: PathBuf,
    },
}

/// Body written for a downloaded file id
pub fn body_of(file_id: &str) -> String {
    format!("content of {}", file_id)
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI32,
    failing_downloads: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
    fail_texts: AtomicBool,
    /// Sends and edits whose text starts with one of these fail
    failing_prefixes: Mutex<Vec<String>>,
}

fn failure(message: impl Into<String>) -> TransportError {
    TransportError::Io(io::Error::other(message.into()))
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            ..Default::default()
        }
    }

    /// Makes every download of `file_id` fail
    pub fn fail_download(&self, file_id: &str) {
        self.failing_downloads.lock().unwrap().insert(file_id.to_string());
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes plain text sends fail (edits and buttons still work)
    pub fn fail_texts(&self, fail: bool) {
        self.fail_texts.store(fail, Ordering::SeqCst);
    }

    /// Makes sends and edits of texts starting with `prefix` fail
    pub fn fail_texts_starting_with(&self, prefix: &str) {
        self.failing_prefixes.lock().unwrap().push(prefix.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Texts of sent messages and edits, in order
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Text { text, .. } | Call::Edit { text, .. } | Call::Buttons { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    pub fn documents(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Document { .. }))
            .collect()
    }

    /// Id of the most recent button prompt
    pub fn last_prompt(&self) -> Option<MessageId> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Buttons { id, .. } => Some(id),
            _ => None,
        })
    }

    fn rejects(&self, text: &str) -> bool {
        self.failing_prefixes.lock().unwrap().iter().any(|prefix| text.starts_with(prefix.as_str()))
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, TransportError> {
        if self.fail_texts.load(Ordering::SeqCst) || self.rejects(text) {
            return Err(failure("sendMessage failed"));
        }
        let id = self.next_message_id();
        self.record(Call::Text {
            chat,
            text: text.to_string(),
            id,
        });
        Ok(id)
    }

    async fn send_buttons(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[ChoiceButton],
    ) -> Result<MessageId, TransportError> {
        let id = self.next_message_id();
        self.record(Call::Buttons {
            chat,
            text: text.to_string(),
            payloads: buttons.iter().map(|b| b.payload.clone()).collect(),
            id,
        });
        Ok(id)
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), TransportError> {
        if self.rejects(text) {
            return Err(failure("editMessageText failed"));
        }
        self.record(Call::Edit {
            chat,
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_photo(&self, chat: ChatId, photo: &ThumbnailRef) -> Result<(), TransportError> {
        self.record(Call::Photo {
            chat,
            file_id: photo.as_str().to_string(),
        });
        Ok(())
    }

    async fn download(&self, file_id: &str, destination: &Path) -> Result<u64, TransportError> {
        self.record(Call::Download {
            file_id: file_id.to_string(),
        });
        if self.failing_downloads.lock().unwrap().contains(file_id) {
            return Err(failure(format!("file {} is unavailable", file_id)));
        }
        let body = body_of(file_id);
        tokio::fs::write(destination, &body).await?;
        Ok(body.len() as u64)
    }

    async fn send_document(
        &self,
        chat: ChatId,
        file: &Path,
        filename: &str,
        thumbnail: Option<&Path>,
    ) -> Result<(), TransportError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(failure("sendDocument failed"));
        }
        let body = tokio::fs::read_to_string(file).await?;
        if let Some(thumbnail) = thumbnail {
            tokio::fs::metadata(thumbnail).await?;
        }
        self.record(Call::Document {
            chat,
            filename: filename.to_string(),
            body,
            thumbnail: thumbnail.is_some(),
            workdir: file.parent().map(Path::to_path_buf).unwrap_or_default(),
        });
        Ok(())
    }
}

//! Messaging transport seam
//!
//! The interaction flow and the re-upload pipeline talk to Telegram only through [`Transport`], so the
//! state machine can be driven by an in-memory recorder in tests. [`TelegramTransport`] is the
//! production implementation on top of a teloxide [`Bot`].

use async_trait::async_trait;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};

use crate::core::error::TransportError;
use crate::core::types::ThumbnailRef;
use crate::telegram::Bot;

/// Inline button offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceButton {
    pub label: String,
    /// Callback payload delivered back on press
    pub payload: String,
}

impl ChoiceButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound operations the bot needs from the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, TransportError>;

    /// Sends a text message with one row of inline buttons.
    async fn send_buttons(&self, chat: ChatId, text: &str, buttons: &[ChoiceButton])
        -> Result<MessageId, TransportError>;

    /// Replaces the text of a previously sent message (and drops its buttons).
    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), TransportError>;

    /// Sends a stored thumbnail back as a photo.
    async fn send_photo(&self, chat: ChatId, photo: &ThumbnailRef) -> Result<(), TransportError>;

    /// Downloads a remote file into `destination`, returning the number of bytes written.
    async fn download(&self, file_id: &str, destination: &Path) -> Result<u64, TransportError>;

    /// Uploads a local file as a document named `filename`, optionally with a thumbnail image.
    async fn send_document(
        &self,
        chat: ChatId,
        file: &Path,
        filename: &str,
        thumbnail: Option<&Path>,
    ) -> Result<(), TransportError>;
}

/// [`Transport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(buttons: &[ChoiceButton]) -> InlineKeyboardMarkup {
    let row = buttons
        .iter()
        .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.payload.clone()))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

/// Opens the download target; errors name the path.
async fn create_destination(path: &Path) -> Result<fs_err::tokio::File, TransportError> {
    Ok(fs_err::tokio::File::create(path).await?)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, TransportError> {
        let message = self.bot.send_message(chat, text).await?;
        Ok(message.id)
    }

    async fn send_buttons(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[ChoiceButton],
    ) -> Result<MessageId, TransportError> {
        let message = self.bot.send_message(chat, text).reply_markup(keyboard(buttons)).await?;
        Ok(message.id)
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), TransportError> {
        self.bot.edit_message_text(chat, message, text).await?;
        Ok(())
    }

    async fn send_photo(&self, chat: ChatId, photo: &ThumbnailRef) -> Result<(), TransportError> {
        self.bot
            .send_photo(chat, InputFile::file_id(FileId(photo.as_str().to_string())))
            .await?;
        Ok(())
    }

    async fn download(&self, file_id: &str, destination: &Path) -> Result<u64, TransportError> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        log::debug!("Downloading {} ({} bytes) to {}", file.path, file.size, destination.display());

        let mut dst = create_destination(destination).await?;
        self.bot.download_file(&file.path, &mut dst).await?;
        dst.sync_all().await?;

        let written = fs_err::tokio::metadata(destination).await?.len();
        Ok(written)
    }

    async fn send_document(
        &self,
        chat: ChatId,
        file: &Path,
        filename: &str,
        thumbnail: Option<&Path>,
    ) -> Result<(), TransportError> {
        let document = InputFile::file(file.to_path_buf()).file_name(filename.to_string());
        let mut request = self.bot.send_document(chat, document);
        if let Some(thumbnail) = thumbnail {
            request = request.thumbnail(InputFile::file(thumbnail.to_path_buf()));
        }
        request.await?;
        Ok(())
    }
}

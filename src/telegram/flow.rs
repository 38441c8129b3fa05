//! Interaction state machine
//!
//! Every inbound update is reduced to an [`Event`] and handed to [`Flow::handle`] together with the
//! sender's user and chat id. The flow takes the user's session lock, applies the transition for the
//! current [`PendingOperation`] and replies through the [`Transport`]. Commands are handled first and
//! interrupt whatever flow is in progress.

use indoc::indoc;
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumString};
use teloxide::types::{ChatId, MessageId, UserId};

use crate::core::config;
use crate::core::error::{AppResult, PipelineError};
use crate::core::session::{PendingOperation, SessionGuard, SessionStore};
use crate::core::types::{DocumentRef, PhotoVariant, ThumbnailRef};
use crate::download::reupload::ReuploadPipeline;
use crate::storage::thumbnails::ThumbnailStore;
use crate::telegram::bot::Command;
use crate::telegram::transport::{ChoiceButton, Transport};

pub const WELCOME: &str = indoc! {"
    Hi! I send your documents back with a custom thumbnail.

    /set_thumbnail - set a new thumbnail
    /view_thumbnail - show your current thumbnail
    /cancel - cancel the current operation

    Set a thumbnail first, then send me any document."};

pub const ASK_PHOTO: &str = "Send me the photo you want to use as thumbnail.";
pub const NOT_A_PHOTO: &str = "That is not a photo. Send a photo, or /cancel.";
pub const THUMBNAIL_SAVED: &str = "Thumbnail saved ✅";
pub const THUMBNAIL_NOT_SAVED: &str = "Couldn't save your thumbnail, please try again later.";
pub const NO_THUMBNAIL: &str = "You have no thumbnail. Use /set_thumbnail first.";
pub const SET_THUMBNAIL_FIRST: &str = "Set a thumbnail first with /set_thumbnail, then send the document again.";
pub const RENAME_QUESTION: &str = "Do you want to rename this file?";
pub const RENAME_REPROMPT: &str = "Please choose Yes or No above, or /cancel.";
pub const ASK_FILENAME: &str = "Send me the new file name.";
pub const FILENAME_REPROMPT: &str = "Send the new file name as text, or /cancel.";
pub const BUSY: &str = "Finish the current operation or /cancel it before sending another document.";
pub const STALE_CHOICE: &str = "This choice is no longer active.";
pub const CANCELLED: &str = "Cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const EXPIRED: &str = "Your previous operation expired, please start over.";
pub const UPLOADING: &str = "Uploading…";
pub const DOWNLOAD_FAILED: &str = "Couldn't download your document. Please send it again.";
pub const UPLOAD_FAILED: &str = "Couldn't send the document back. Please try again.";
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

/// Inbound event after the dispatcher stripped the transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// All resolution variants of one photo, in transport order
    Photo(Vec<PhotoVariant>),
    Document(DocumentRef),
    Text(String),
    /// Inline button press with the message the button belongs to
    Button {
        payload: String,
        message: Option<MessageId>,
    },
    /// Anything else (stickers, voice, unknown commands...)
    Other,
}

impl Event {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Command(_) => "command",
            Event::Photo(_) => "photo",
            Event::Document(_) => "document",
            Event::Text(_) => "text",
            Event::Button { .. } => "button",
            Event::Other => "other",
        }
    }
}

/// Callback payloads of the rename prompt buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum RenameChoice {
    #[strum(serialize = "rename:yes")]
    Yes,
    #[strum(serialize = "rename:no")]
    No,
}

impl RenameChoice {
    pub fn buttons() -> [ChoiceButton; 2] {
        [
            ChoiceButton::new("Yes", RenameChoice::Yes.as_ref()),
            ChoiceButton::new("No", RenameChoice::No.as_ref()),
        ]
    }
}

/// Which variant of a multi-size photo becomes the thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PhotoSelection {
    /// Largest width × height
    #[default]
    Largest,
    /// Largest byte size
    LargestFile,
    /// Last variant as delivered
    Last,
}

impl PhotoSelection {
    pub fn select<'a>(&self, variants: &'a [PhotoVariant]) -> Option<&'a PhotoVariant> {
        match self {
            PhotoSelection::Largest => variants.iter().max_by_key(|photo| photo.area()),
            PhotoSelection::LargestFile => variants.iter().max_by_key(|photo| photo.file_size),
            PhotoSelection::Last => variants.last(),
        }
    }
}

/// Tunables of the state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowConfig {
    pub photo_selection: PhotoSelection,
    /// Documents above this many bytes are refused; `None` accepts any size
    pub max_document_size: Option<u64>,
}

impl FlowConfig {
    pub fn from_env() -> Self {
        let photo_selection = PhotoSelection::from_str(config::PHOTO_SELECTION.trim()).unwrap_or_else(|_| {
            log::warn!(
                "Unknown PHOTO_SELECTION '{}', using '{}'",
                config::PHOTO_SELECTION.as_str(),
                PhotoSelection::default()
            );
            PhotoSelection::default()
        });

        Self {
            photo_selection,
            max_document_size: config::limits::max_document_size(),
        }
    }
}

/// Per-user interaction state machine.
pub struct Flow {
    transport: Arc<dyn Transport>,
    thumbnails: Arc<ThumbnailStore>,
    sessions: Arc<SessionStore>,
    pipeline: ReuploadPipeline,
    config: FlowConfig,
}

impl Flow {
    pub fn new(
        transport: Arc<dyn Transport>,
        thumbnails: Arc<ThumbnailStore>,
        sessions: Arc<SessionStore>,
        pipeline: ReuploadPipeline,
        config: FlowConfig,
    ) -> Self {
        Self {
            transport,
            thumbnails,
            sessions,
            pipeline,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn thumbnails(&self) -> &ThumbnailStore {
        &self.thumbnails
    }

    /// Handles one event for `user`. Never fails: errors are logged and reported to the chat.
    pub async fn handle(&self, user: UserId, chat: ChatId, event: Event) {
        let mut session = self.sessions.lock(user).await;
        log::debug!("User {}: {} in state {}", user, event.name(), session.operation().name());

        if let Err(e) = self.dispatch(&mut session, chat, event).await {
            log::error!("Failed to handle event for user {}: {}", user, e);
            self.notify(chat, GENERIC_FAILURE).await;
        }

        drop(session);
        self.sessions.release(user);
    }

    async fn dispatch(&self, session: &mut SessionGuard, chat: ChatId, event: Event) -> AppResult<()> {
        let event = match event {
            Event::Command(command) => return self.on_command(session, chat, command).await,
            event => event,
        };

        if session.expired().is_some() {
            self.transport.send_text(chat, EXPIRED).await?;
        }

        match session.operation().clone() {
            PendingOperation::Idle => self.on_idle(session, chat, event).await,
            PendingOperation::AwaitingThumbnailPhoto => self.on_thumbnail_photo(session, chat, event).await,
            PendingOperation::AwaitingRenameDecision { document, prompt } => {
                self.on_rename_decision(session, chat, document, prompt, event).await
            }
            PendingOperation::AwaitingNewFilename { document, prompt } => {
                self.on_new_filename(session, chat, document, prompt, event).await
            }
        }
    }

    async fn on_command(&self, session: &mut SessionGuard, chat: ChatId, command: Command) -> AppResult<()> {
        match command {
            Command::Start => {
                self.transport.send_text(chat, WELCOME).await?;
            }
            Command::ViewThumbnail => match self.thumbnails.get(session.user()).await {
                Some(thumbnail) => self.transport.send_photo(chat, &thumbnail).await?,
                None => {
                    self.transport.send_text(chat, NO_THUMBNAIL).await?;
                }
            },
            Command::SetThumbnail => {
                let previous = session.take();
                session.begin(PendingOperation::AwaitingThumbnailPhoto);
                self.retire_prompt(chat, &previous).await;
                self.transport.send_text(chat, ASK_PHOTO).await?;
            }
            Command::Cancel => {
                let previous = session.take();
                if previous.is_idle() {
                    self.transport.send_text(chat, NOTHING_TO_CANCEL).await?;
                } else {
                    log::info!("User {} cancelled {}", session.user(), previous.name());
                    self.retire_prompt(chat, &previous).await;
                    self.transport.send_text(chat, CANCELLED).await?;
                }
            }
        }
        Ok(())
    }

    async fn on_idle(&self, session: &mut SessionGuard, chat: ChatId, event: Event) -> AppResult<()> {
        match event {
            Event::Document(document) => {
                if self.thumbnails.get(session.user()).await.is_none() {
                    self.transport.send_text(chat, SET_THUMBNAIL_FIRST).await?;
                    return Ok(());
                }

                if let Some(limit) = self.config.max_document_size {
                    if document.size > limit {
                        log::info!(
                            "User {}: refusing {} ({} bytes, limit {})",
                            session.user(),
                            document.original_filename,
                            document.size,
                            limit
                        );
                        let text = format!("This file is too large. The limit is {} MB.", limit / (1024 * 1024));
                        self.transport.send_text(chat, &text).await?;
                        return Ok(());
                    }
                }

                let prompt = self
                    .transport
                    .send_buttons(chat, RENAME_QUESTION, &RenameChoice::buttons())
                    .await?;
                session.begin(PendingOperation::AwaitingRenameDecision {
                    document,
                    prompt: Some(prompt),
                });
            }
            Event::Button { .. } => {
                self.transport.send_text(chat, STALE_CHOICE).await?;
            }
            other => {
                log::debug!("User {}: ignoring {} while idle", session.user(), other.name());
            }
        }
        Ok(())
    }

    async fn on_thumbnail_photo(&self, session: &mut SessionGuard, chat: ChatId, event: Event) -> AppResult<()> {
        match event {
            Event::Photo(variants) => {
                let Some(photo) = self.config.photo_selection.select(&variants) else {
                    self.transport.send_text(chat, NOT_A_PHOTO).await?;
                    return Ok(());
                };

                let thumbnail = ThumbnailRef::new(photo.file_id.clone());
                session.clear();
                match self.thumbnails.set(session.user(), thumbnail).await {
                    Ok(()) => {
                        self.transport.send_text(chat, THUMBNAIL_SAVED).await?;
                    }
                    Err(e) => {
                        log::error!("Failed to save thumbnail for user {}: {}", session.user(), e);
                        self.transport.send_text(chat, THUMBNAIL_NOT_SAVED).await?;
                    }
                }
            }
            Event::Button { .. } => {
                self.transport.send_text(chat, STALE_CHOICE).await?;
            }
            _ => {
                self.transport.send_text(chat, NOT_A_PHOTO).await?;
            }
        }
        Ok(())
    }

    async fn on_rename_decision(
        &self,
        session: &mut SessionGuard,
        chat: ChatId,
        document: DocumentRef,
        prompt: Option<MessageId>,
        event: Event,
    ) -> AppResult<()> {
        match event {
            Event::Button { payload, message } => {
                let from_other_prompt = matches!((prompt, message), (Some(p), Some(m)) if p != m);
                let choice = match RenameChoice::from_str(&payload) {
                    Ok(choice) if !from_other_prompt => choice,
                    _ => {
                        self.transport.send_text(chat, STALE_CHOICE).await?;
                        return Ok(());
                    }
                };

                match choice {
                    RenameChoice::No => {
                        session.clear();
                        self.run_reupload(session.user(), chat, &document, None, prompt).await;
                    }
                    RenameChoice::Yes => {
                        session.begin(PendingOperation::AwaitingNewFilename {
                            document: document.clone(),
                            prompt,
                        });
                        match prompt {
                            Some(prompt) => self.transport.edit_text(chat, prompt, ASK_FILENAME).await?,
                            None => {
                                let asked = self.transport.send_text(chat, ASK_FILENAME).await?;
                                session.begin(PendingOperation::AwaitingNewFilename {
                                    document,
                                    prompt: Some(asked),
                                });
                            }
                        }
                    }
                }
            }
            Event::Document(_) => {
                self.transport.send_text(chat, BUSY).await?;
            }
            _ => {
                self.transport.send_text(chat, RENAME_REPROMPT).await?;
            }
        }
        Ok(())
    }

    async fn on_new_filename(
        &self,
        session: &mut SessionGuard,
        chat: ChatId,
        document: DocumentRef,
        prompt: Option<MessageId>,
        event: Event,
    ) -> AppResult<()> {
        match event {
            Event::Text(text) if !text.trim().is_empty() => {
                session.clear();
                self.run_reupload(session.user(), chat, &document, Some(text.trim()), prompt)
                    .await;
            }
            Event::Document(_) => {
                self.transport.send_text(chat, BUSY).await?;
            }
            Event::Button { .. } => {
                self.transport.send_text(chat, STALE_CHOICE).await?;
            }
            _ => {
                self.transport.send_text(chat, FILENAME_REPROMPT).await?;
            }
        }
        Ok(())
    }

    /// Runs the pipeline and reports the outcome in a status message. The session is already idle.
    ///
    /// Reporting is best-effort: once the document is delivered, a failed status update must not turn
    /// into a failure notice.
    async fn run_reupload(
        &self,
        user: UserId,
        chat: ChatId,
        document: &DocumentRef,
        requested: Option<&str>,
        status: Option<MessageId>,
    ) {
        let status = self.show_status(chat, status, UPLOADING).await;
        let thumbnail = self.thumbnails.get(user).await;

        let outcome = match self.pipeline.reupload(chat, document, requested, thumbnail.as_ref()).await {
            Ok(report) if report.with_thumbnail => format!("Done: {}", report.filename),
            Ok(report) => format!("Done: {} (sent without thumbnail, it could not be fetched)", report.filename),
            Err(e) => {
                log::error!("Re-upload failed for user {}: {}", user, e);
                match e {
                    PipelineError::Download(_) => DOWNLOAD_FAILED.to_string(),
                    PipelineError::Upload(_) => UPLOAD_FAILED.to_string(),
                    PipelineError::TempStorage(_) => GENERIC_FAILURE.to_string(),
                }
            }
        };

        let reported = match status {
            Some(status) => self.transport.edit_text(chat, status, &outcome).await,
            None => self.transport.send_text(chat, &outcome).await.map(|_| ()),
        };
        if let Err(e) = reported {
            log::warn!("Failed to report re-upload outcome in chat {}: {}", chat, e);
        }
    }

    /// Shows `text` in `existing` (or a new message); a failure only costs the progress display.
    async fn show_status(&self, chat: ChatId, existing: Option<MessageId>, text: &str) -> Option<MessageId> {
        let shown = match existing {
            Some(message) => self.transport.edit_text(chat, message, text).await.map(|_| message),
            None => self.transport.send_text(chat, text).await,
        };
        shown
            .map_err(|e| log::warn!("Failed to show status in chat {}: {}", chat, e))
            .ok()
    }

    /// Removes the buttons of an abandoned rename prompt.
    async fn retire_prompt(&self, chat: ChatId, previous: &PendingOperation) {
        if let PendingOperation::AwaitingRenameDecision {
            prompt: Some(prompt), ..
        } = previous
        {
            if let Err(e) = self.transport.edit_text(chat, *prompt, CANCELLED).await {
                log::warn!("Failed to retire rename prompt in chat {}: {}", chat, e);
            }
        }
    }

    async fn notify(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.transport.send_text(chat, text).await {
            log::warn!("Failed to notify chat {}: {}", chat, e);
        }
    }
}

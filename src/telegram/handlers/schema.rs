//! Dispatcher schema and update → event conversion

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message};

use super::types::{HandlerDeps, HandlerError, Sender};
use crate::core::types::{DocumentRef, PhotoVariant};
use crate::telegram::bot::Command;
use crate::telegram::flow::Event;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Only private chats are served. Commands are matched first; every other message and every button
/// press is converted into an [`Event`] and handed to the flow.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| Sender::from_message(&msg).is_some())
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(move |msg: Message, cmd: Command| {
                    let deps = deps.clone();
                    async move {
                        if let Some(sender) = Sender::from_message(&msg) {
                            log::info!("🎯 Received command: {:?} from chat {}", cmd, sender.chat);
                            deps.flow.handle(sender.user, sender.chat, Event::Command(cmd)).await;
                        }
                        Ok(())
                    }
                }),
        )
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| Sender::from_message(&msg))
        .endpoint(move |msg: Message, sender: Sender| {
            let deps = deps.clone();
            async move {
                deps.flow.handle(sender.user, sender.chat, event_from_message(&msg)).await;
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            // Stops the client-side spinner; the flow replies with a normal message
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let message = q.message.as_ref();
            if message.is_some_and(|m| !m.chat().is_private()) {
                return Ok(());
            }
            let chat = message.map(|m| m.chat().id).unwrap_or(ChatId(q.from.id.0 as i64));
            let event = Event::Button {
                payload: q.data.clone().unwrap_or_default(),
                message: message.map(|m| m.id()),
            };

            deps.flow.handle(q.from.id, chat, event).await;
            Ok(())
        }
    })
}

/// Reduces a non-command message to a flow event.
pub fn event_from_message(msg: &Message) -> Event {
    if let Some(photo) = msg.photo() {
        let variants = photo
            .iter()
            .map(|size| PhotoVariant {
                file_id: size.file.id.0.clone(),
                width: size.width,
                height: size.height,
                file_size: size.file.size,
            })
            .collect();
        return Event::Photo(variants);
    }

    if let Some(document) = msg.document() {
        return Event::Document(DocumentRef::new(
            document.file.id.0.clone(),
            document.file_name.clone(),
            u64::from(document.file.size),
        ));
    }

    match msg.text() {
        // Unknown commands are not file names
        Some(text) if text.starts_with('/') => Event::Other,
        Some(text) => Event::Text(text.to_string()),
        None => Event::Other,
    }
}

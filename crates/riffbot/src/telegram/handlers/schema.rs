//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::handle_start_command;
use super::types::{request_origin, HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands first, then any other text is treated as a candidate link.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(command_handler()).branch(message_handler(deps))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        |bot: Bot, msg: Message, cmd: Command| async move {
            log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
            match cmd {
                Command::Start | Command::Help => handle_start_command(&bot, &msg).await?,
            }
            Ok(())
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                let (requester, chat) = request_origin(&msg);

                // The dispatcher handles one update per chat at a time; run the
                // request in the background so a second link is answered at once
                tokio::spawn(async move {
                    if let Err(e) = deps
                        .pipeline
                        .handle_request(requester, chat, &text, deps.delivery.clone())
                        .await
                    {
                        log::debug!("Request from {} ended with {}", requester, e.category());
                    }
                });
                Ok(())
            }
        })
}

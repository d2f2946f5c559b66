//! Bot API implementation of the pipeline's chat surface

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode, ReplyParameters};

use super::Bot;
use riffcore::delivery::{AudioUpload, ChatDelivery, ChatRef, DeliveryError, StatusMessageId};

/// Sends everything through one bot instance
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn delivery_error(e: teloxide::RequestError) -> DeliveryError {
    DeliveryError(e.to_string())
}

#[async_trait]
impl ChatDelivery for TelegramDelivery {
    async fn send_status(&self, chat: ChatRef, text: &str) -> Result<StatusMessageId, DeliveryError> {
        let msg = self
            .bot
            .send_message(ChatId(chat.chat_id), text)
            .await
            .map_err(delivery_error)?;
        Ok(StatusMessageId(msg.id.0))
    }

    async fn edit_status(&self, chat: ChatRef, message: StatusMessageId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .edit_message_text(ChatId(chat.chat_id), MessageId(message.0), text)
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn delete_status(&self, chat: ChatRef, message: StatusMessageId) -> Result<(), DeliveryError> {
        self.bot
            .delete_message(ChatId(chat.chat_id), MessageId(message.0))
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn send_text(&self, chat: ChatRef, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat.chat_id), text)
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn send_audio(&self, chat: ChatRef, upload: AudioUpload<'_>) -> Result<(), DeliveryError> {
        let mut request = self
            .bot
            .send_audio(ChatId(chat.chat_id), InputFile::file(upload.path))
            .caption(upload.caption)
            .parse_mode(ParseMode::MarkdownV2)
            .title(upload.title);

        if let Some(duration) = upload.duration_secs {
            request = request.duration(duration);
        }
        if let Some(performer) = upload.performer {
            request = request.performer(performer);
        }
        if let Some(reply_to) = chat.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        request.await.map_err(delivery_error)?;
        Ok(())
    }
}

//! Outbound chat surface used by the pipeline.
//!
//! The bot crate implements [`ChatDelivery`] on top of the Telegram Bot API;
//! tests implement it with an in-memory recorder.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Where a request came from and where its replies go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub chat_id: i64,
    /// Message the audio is sent as a reply to
    pub reply_to: Option<i32>,
}

impl ChatRef {
    pub fn new(chat_id: i64) -> Self {
        Self { chat_id, reply_to: None }
    }

    pub fn replying_to(mut self, message_id: i32) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Id of the editable status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusMessageId(pub i32);

/// Failure reported by the chat API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeliveryError(pub String);

impl From<String> for DeliveryError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeliveryError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Finished audio file ready to be sent
#[derive(Debug, Clone)]
pub struct AudioUpload<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    /// Caption in Telegram legacy Markdown
    pub caption: &'a str,
    pub duration_secs: Option<u32>,
    pub performer: Option<&'a str>,
}

#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn send_status(&self, chat: ChatRef, text: &str) -> Result<StatusMessageId, DeliveryError>;

    async fn edit_status(&self, chat: ChatRef, message: StatusMessageId, text: &str) -> Result<(), DeliveryError>;

    async fn delete_status(&self, chat: ChatRef, message: StatusMessageId) -> Result<(), DeliveryError>;

    async fn send_text(&self, chat: ChatRef, text: &str) -> Result<(), DeliveryError>;

    async fn send_audio(&self, chat: ChatRef, upload: AudioUpload<'_>) -> Result<(), DeliveryError>;
}

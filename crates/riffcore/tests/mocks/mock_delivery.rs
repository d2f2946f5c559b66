//! In-memory chat surface that records every call

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use riffcore::delivery::{AudioUpload, ChatDelivery, ChatRef, DeliveryError, StatusMessageId};

pub const STATUS_MESSAGE: StatusMessageId = StatusMessageId(100);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendStatus(String),
    Edit(String),
    Delete(StatusMessageId),
    Text(String),
    Audio {
        path: PathBuf,
        title: String,
        caption: String,
        /// Whether the file was on disk while being sent
        existed: bool,
        reply_to: Option<i32>,
    },
}

#[derive(Default)]
pub struct MockDelivery {
    calls: Mutex<Vec<Call>>,
    pub fail_edits: AtomicBool,
    pub fail_audio: AtomicBool,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn audio(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Audio { .. }))
            .collect()
    }

    pub fn deleted(&self) -> bool {
        self.calls().iter().any(|c| matches!(c, Call::Delete(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatDelivery for MockDelivery {
    async fn send_status(&self, _chat: ChatRef, text: &str) -> Result<StatusMessageId, DeliveryError> {
        self.record(Call::SendStatus(text.to_string()));
        Ok(STATUS_MESSAGE)
    }

    async fn edit_status(&self, _chat: ChatRef, _message: StatusMessageId, text: &str) -> Result<(), DeliveryError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err("Bad Request: message to edit not found".into());
        }
        self.record(Call::Edit(text.to_string()));
        Ok(())
    }

    async fn delete_status(&self, _chat: ChatRef, message: StatusMessageId) -> Result<(), DeliveryError> {
        self.record(Call::Delete(message));
        Ok(())
    }

    async fn send_text(&self, _chat: ChatRef, text: &str) -> Result<(), DeliveryError> {
        self.record(Call::Text(text.to_string()));
        Ok(())
    }

    async fn send_audio(&self, chat: ChatRef, upload: AudioUpload<'_>) -> Result<(), DeliveryError> {
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err("Request Entity Too Large".into());
        }
        self.record(Call::Audio {
            path: upload.path.to_path_buf(),
            title: upload.title.to_string(),
            caption: upload.caption.to_string(),
            existed: upload.path.exists(),
            reply_to: chat.reply_to,
        });
        Ok(())
    }
}

//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::Message;

use riffcore::delivery::{ChatDelivery, ChatRef};
use riffcore::jobs::RequesterId;
use riffcore::pipeline::Pipeline;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub pipeline: Arc<Pipeline>,
    pub delivery: Arc<dyn ChatDelivery>,
}

impl HandlerDeps {
    pub fn new(pipeline: Arc<Pipeline>, delivery: Arc<dyn ChatDelivery>) -> Self {
        Self { pipeline, delivery }
    }
}

/// Who sent the message and where replies go.
///
/// Jobs are keyed by the sender; anonymous channel posts fall back to the chat id.
pub fn request_origin(msg: &Message) -> (RequesterId, ChatRef) {
    let requester = msg
        .from
        .as_ref()
        .and_then(|user| i64::try_from(user.id.0).ok())
        .map(RequesterId)
        .unwrap_or(RequesterId(msg.chat.id.0));
    (requester, ChatRef::new(msg.chat.id.0).replying_to(msg.id.0))
}

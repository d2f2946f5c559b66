//! Animated status message for a running job.
//!
//! The reporter owns no state of its own: every tick it reads the job's status
//! text, prepends the next animation frame and pushes the result to a
//! [`StatusSink`] when it changed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::tracker::JobStatus;
use crate::delivery::{ChatDelivery, ChatRef, DeliveryError, StatusMessageId};

/// Animation frames, one per tick
pub const FRAMES: [&str; 6] = ["🔄", "🌀", "💿", "📀", "⏳", "➡️"];

/// Something that can replace the text of the status message
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn edit(&self, text: &str) -> Result<(), DeliveryError>;
}

/// The status message of one chat
pub struct StatusMessage {
    pub delivery: Arc<dyn ChatDelivery>,
    pub chat: ChatRef,
    pub message: StatusMessageId,
}

#[async_trait]
impl StatusSink for StatusMessage {
    async fn edit(&self, text: &str) -> Result<(), DeliveryError> {
        self.delivery.edit_status(self.chat, self.message, text).await
    }
}

/// `"{frame} {text}"` for the given tick
pub fn render_frame(frames: &[&str], tick: usize, text: &str) -> String {
    match frames.get(tick % frames.len().max(1)) {
        Some(frame) => format!("{} {}", frame, text),
        None => text.to_string(),
    }
}

/// Reporter settings
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub tick: Duration,
    pub frames: &'static [&'static str],
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            tick: crate::core::config::progress::tick(),
            frames: &FRAMES,
        }
    }
}

impl ReporterConfig {
    pub fn with_tick(tick: Duration) -> Self {
        Self { tick, frames: &FRAMES }
    }
}

/// Running reporter task
#[derive(Debug)]
pub struct ReporterHandle {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ReporterHandle {
    /// Stops the task and waits until it has exited.
    ///
    /// No edit is in flight once this returns.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::debug!("Progress reporter ended abnormally: {}", e);
        }
    }
}

/// Starts the reporter for a job.
///
/// The task ends when `cancel` fires (job removed) or the job disappears.
pub fn spawn_reporter(
    status: JobStatus,
    cancel: CancellationToken,
    sink: Arc<dyn StatusSink>,
    config: ReporterConfig,
) -> ReporterHandle {
    let task_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        run(status, task_cancel, sink, config).await;
    });
    ReporterHandle { task, cancel }
}

async fn run(status: JobStatus, cancel: CancellationToken, sink: Arc<dyn StatusSink>, config: ReporterConfig) {
    let id = status.id();
    let mut last_rendered = String::new();
    let mut tick = 0usize;

    log::debug!("Progress reporter started for {}", id);
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Some(text) = status.get() else {
            break;
        };

        let rendered = render_frame(config.frames, tick, &text);
        if rendered != last_rendered {
            if let Err(e) = sink.edit(&rendered).await {
                log::debug!("Status edit failed for {}: {}", id, e);
            }
            last_rendered = rendered;
        }
        tick = tick.wrapping_add(1);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.tick) => {}
        }
    }
    log::debug!("Progress reporter stopped for {}", id);
}

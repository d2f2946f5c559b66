//! riffcore - the Telegram-free half of riffgrab
//!
//! Turns a video link into an MP3 on disk while keeping a status message
//! animated, then hands the file to an injected chat surface.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process execution and validation
//! - `delivery`: the outbound chat trait
//! - `download`: yt-dlp fetcher, ffmpeg transcoder, temp files and status texts
//! - `jobs`: in-flight job registry and the progress reporter
//! - `pipeline`: the request handler tying everything together

pub mod core;
pub mod delivery;
pub mod download;
pub mod jobs;
pub mod pipeline;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use delivery::{AudioUpload, ChatDelivery, ChatRef, DeliveryError, StatusMessageId};
pub use jobs::{JobTracker, RequesterId};
pub use pipeline::{DeliveryReport, Pipeline, PipelineSettings};

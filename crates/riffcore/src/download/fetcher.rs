//! Media fetcher contract.
//!
//! A fetcher runs on a blocking worker thread and reports progress through a
//! plain callback; it never touches the async runtime.

use std::path::PathBuf;

use crate::core::error::DownloadError;

/// What to download and where to put it
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    /// Directory for the artifact
    pub output_dir: PathBuf,
    /// Every produced file name starts with this (e.g. `"42_"`)
    pub artifact_prefix: String,
    /// When set, the fetcher extracts MP3 at this bitrate itself
    pub mp3_bitrate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Downloading,
    Finished,
}

/// One progress report from the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    pub status: FetchStatus,
    pub downloaded_bytes: u64,
    /// Exact or estimated total, when the source knows it
    pub total_bytes: Option<u64>,
}

impl FetchProgress {
    pub fn downloading(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            status: FetchStatus::Downloading,
            downloaded_bytes,
            total_bytes,
        }
    }

    pub fn finished(downloaded_bytes: u64) -> Self {
        Self {
            status: FetchStatus::Finished,
            downloaded_bytes,
            total_bytes: Some(downloaded_bytes),
        }
    }
}

/// Extra fields reported by the fetcher, all optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub duration_secs: Option<u32>,
    pub uploader: Option<String>,
    pub extractor: Option<String>,
}

/// The materialized artifact
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub path: PathBuf,
    pub title: String,
    pub metadata: MediaMetadata,
}

impl FetchedMedia {
    /// True when the artifact already is an MP3 file
    pub fn is_mp3(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mp3"))
    }
}

/// Downloads media for a URL.
///
/// Implementations block; call them from `tokio::task::spawn_blocking`.
pub trait MediaFetcher: Send + Sync {
    fn fetch(
        &self,
        request: &FetchRequest,
        on_progress: &mut dyn FnMut(FetchProgress),
    ) -> Result<FetchedMedia, DownloadError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "fetcher"
    }
}

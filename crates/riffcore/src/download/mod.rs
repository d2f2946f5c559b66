//! Everything between a URL and an MP3 file on disk

pub mod cookies;
pub mod fetcher;
pub mod progress;
pub mod temp;
pub mod transcode;
pub mod ytdlp;

pub use cookies::{ensure_cookies_file, CookiesSetup};
pub use crate::core::error::DownloadError;
pub use fetcher::{FetchProgress, FetchRequest, FetchStatus, FetchedMedia, MediaFetcher, MediaMetadata};
pub use transcode::{FfmpegTranscoder, Transcoder, TranscoderKind};
pub use ytdlp::YtDlpFetcher;

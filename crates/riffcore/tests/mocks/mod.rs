//! Mock implementations of the fetcher, transcoder and chat surface
//!
//! Lets the whole pipeline run without yt-dlp, ffmpeg or Telegram.

pub mod mock_delivery;
pub mod mock_fetcher;

pub use mock_delivery::{Call, MockDelivery};
pub use mock_fetcher::{CopyTranscoder, MockFetcher, MockFetcherConfig};

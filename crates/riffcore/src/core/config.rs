//! Configuration for the bot, read once from the process environment.
//!
//! `.env` files are loaded by the binary before any of these statics is touched.

use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::download::transcode::TranscoderKind;

/// Bot token
/// Read from BOT_TOKEN, TELOXIDE_TOKEN or the legacy `bot` variable
pub static BOT_TOKEN: Lazy<SecretString> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .or_else(|_| env::var("bot"))
        .unwrap_or_default()
        .into()
});

/// Custom Bot API server URL (local telegram-bot-api)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok().filter(|s| !s.is_empty()));

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// ffmpeg binary path, used when TRANSCODER=ffmpeg
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// Raw Netscape cookie blob for YouTube authentication
/// Read from YOUTUBE_COOKIES; materialized to COOKIES_PATH at startup
pub static YOUTUBE_COOKIES: Lazy<Option<SecretString>> = Lazy::new(|| {
    env::var("YOUTUBE_COOKIES")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from)
});

/// Path of the cookies file handed to yt-dlp
/// Supports tilde (~) expansion
pub static COOKIES_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let raw = env::var("COOKIES_PATH").unwrap_or_else(|_| "cookies.txt".to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
});

/// Directory for transient artifacts. Every file is prefixed with the requester id.
/// Defaults to the platform temp directory
pub static TEMP_FILES_DIR: Lazy<PathBuf> = Lazy::new(|| match env::var("TEMP_FILES_DIR") {
    Ok(dir) if !dir.is_empty() => PathBuf::from(shellexpand::tilde(&dir).into_owned()),
    _ => env::temp_dir(),
});

/// Log file path
/// Default: riffgrab.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "riffgrab.log".to_string()));

/// Log level name (error, warn, info, debug, trace)
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Audio configuration
pub mod audio {
    use super::{env, Lazy, TranscoderKind};

    /// Default MP3 bitrate
    pub const DEFAULT_BITRATE: &str = "192k";

    /// Target MP3 bitrate, e.g. "192k" or "320k"
    pub static BITRATE: Lazy<String> = Lazy::new(|| {
        env::var("AUDIO_BITRATE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BITRATE.to_string())
    });

    /// Which tool produces the MP3
    pub static TRANSCODER: Lazy<TranscoderKind> = Lazy::new(|| {
        env::var("TRANSCODER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    });
}

/// Download configuration
pub mod download {
    use super::{env, Duration, Lazy};

    /// Default size ceiling in MiB
    pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 50.0;

    /// Size ceiling in MiB; `None` means unlimited.
    /// MAX_FILE_SIZE_MB=0 or MAX_FILE_SIZE_MB=unlimited disables the check
    pub static MAX_FILE_SIZE_MB: Lazy<Option<f64>> = Lazy::new(|| match env::var("MAX_FILE_SIZE_MB") {
        Ok(raw) => parse_size_limit(&raw),
        Err(_) => Some(DEFAULT_MAX_FILE_SIZE_MB),
    });

    /// Number of fragments yt-dlp downloads in parallel
    pub static CONCURRENT_FRAGMENTS: Lazy<u32> = Lazy::new(|| {
        env::var("CONCURRENT_FRAGMENTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5)
    });

    /// Default timeout for yt-dlp (in seconds)
    pub const DEFAULT_YTDLP_TIMEOUT_SECS: u64 = 600;

    /// Default timeout for ffmpeg (in seconds)
    pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 300;

    /// Timeout for yt-dlp (in seconds)
    pub static YTDLP_TIMEOUT_SECS: Lazy<u64> =
        Lazy::new(|| parse_timeout_secs(env::var("YTDLP_TIMEOUT_SECS").ok().as_deref(), DEFAULT_YTDLP_TIMEOUT_SECS));

    /// Timeout for ffmpeg (in seconds)
    pub static FFMPEG_TIMEOUT_SECS: Lazy<u64> =
        Lazy::new(|| parse_timeout_secs(env::var("FFMPEG_TIMEOUT_SECS").ok().as_deref(), DEFAULT_FFMPEG_TIMEOUT_SECS));

    /// Positive whole seconds; anything else keeps the default
    pub fn parse_timeout_secs(raw: Option<&str>, default: u64) -> u64 {
        raw.and_then(|s| s.trim().parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(default)
    }

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(*YTDLP_TIMEOUT_SECS)
    }

    /// ffmpeg command timeout duration
    pub fn ffmpeg_timeout() -> Duration {
        Duration::from_secs(*FFMPEG_TIMEOUT_SECS)
    }

    /// Parses a MAX_FILE_SIZE_MB value. Garbage falls back to the default.
    pub fn parse_size_limit(raw: &str) -> Option<f64> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(DEFAULT_MAX_FILE_SIZE_MB);
        }
        if raw.eq_ignore_ascii_case("unlimited") || raw.eq_ignore_ascii_case("none") {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(v) if v <= 0.0 => None,
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Invalid MAX_FILE_SIZE_MB '{}', using {}", raw, DEFAULT_MAX_FILE_SIZE_MB);
                Some(DEFAULT_MAX_FILE_SIZE_MB)
            }
        }
    }
}

/// Progress animation configuration
pub mod progress {
    use super::{env, Duration, Lazy};

    /// Interval between reporter ticks (in milliseconds)
    pub const DEFAULT_TICK_MS: u64 = 600;

    pub static TICK_MS: Lazy<u64> = Lazy::new(|| {
        env::var("PROGRESS_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms| *ms >= 100)
            .unwrap_or(DEFAULT_TICK_MS)
    });

    /// Reporter tick duration
    pub fn tick() -> Duration {
        Duration::from_millis(*TICK_MS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Large enough for uploading a 50 MB audio file
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

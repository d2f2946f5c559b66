//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for cookies and the download toolchain

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::str::FromStr;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Level name, e.g. "info" or "debug"; unknown names fall back to info
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str, level: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
    let level = parse_level(level);

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

/// Logs cookies configuration at application startup
pub fn log_cookies_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🍪 Cookies Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = config::COOKIES_PATH.as_path();
    if path.exists() {
        match path.canonicalize() {
            Ok(abs) => log::info!("✅ Cookies file: {}", abs.display()),
            Err(_) => log::warn!("⚠️  Cookies file: {} (exists but cannot canonicalize)", path.display()),
        }
        log::info!("   yt-dlp will be called with --cookies");
    } else if config::YOUTUBE_COOKIES.is_some() {
        log::error!("❌ YOUTUBE_COOKIES is set but {} was not written", path.display());
    } else {
        log::warn!("⚠️  No cookies configured (YOUTUBE_COOKIES not set, {} missing)", path.display());
        log::warn!("   Age-restricted or bot-checked videos will fail");
    }
}

/// Logs the effective download configuration at startup
pub fn log_download_configuration() {
    log::info!("yt-dlp binary: {}", *config::YTDL_BIN);
    log::info!("Transcoder: {} (bitrate {})", *config::audio::TRANSCODER, *config::audio::BITRATE);
    match *config::download::MAX_FILE_SIZE_MB {
        Some(limit) => log::info!("Size ceiling: {:.0} MB", limit),
        None => log::info!("Size ceiling: unlimited"),
    }
    log::info!(
        "Timeouts: yt-dlp {}s, ffmpeg {}s",
        *config::download::YTDLP_TIMEOUT_SECS,
        *config::download::FFMPEG_TIMEOUT_SECS
    );
    log::info!("Temp directory: {}", config::TEMP_FILES_DIR.display());
}

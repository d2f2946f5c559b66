//! Cookie file for yt-dlp.
//!
//! The cookie blob comes from the environment and is written to disk once at
//! startup; yt-dlp reads the file on every fetch.

use anyhow::{Context, Result};
use fs_err as fs;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

/// What happened to the cookies file at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookiesSetup {
    /// A file was already there and was left alone
    Existing,
    /// The blob was written to the path
    Written,
    /// No file and no blob
    Missing,
}

/// Quick sanity check for the Netscape cookie format
pub fn looks_like_netscape(content: &str) -> bool {
    content.lines().any(|l| l.contains("Netscape HTTP Cookie File"))
        || content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .any(|l| l.split('\t').count() >= 7)
}

/// Writes `blob` to `path` unless a file already exists there.
///
/// The write goes to a sibling temp file first and is renamed into place, so
/// yt-dlp never sees a half-written file.
pub fn ensure_cookies_file(path: &Path, blob: Option<&SecretString>) -> Result<CookiesSetup> {
    if path.exists() {
        log::debug!("Cookies file {} already present", path.display());
        return Ok(CookiesSetup::Existing);
    }
    let Some(blob) = blob else {
        return Ok(CookiesSetup::Missing);
    };

    let content = blob.expose_secret();
    if !looks_like_netscape(content) {
        log::warn!("YOUTUBE_COOKIES does not look like a Netscape cookie file, writing it anyway");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create cookies directory")?;
    }

    let temp_path = format!("{}.tmp.{}", path.display(), std::process::id());
    let mut body = content.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    fs::write(&temp_path, body).context("Failed to write temp cookies file")?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).context("Failed to rename cookies file");
    }

    log::info!("✅ Cookies written to {}", path.display());
    Ok(CookiesSetup::Written)
}

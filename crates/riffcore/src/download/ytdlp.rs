//! yt-dlp backed [`MediaFetcher`].
//!
//! yt-dlp is asked for two machine-readable outputs on top of the download:
//! a progress line per update (`--progress-template`) and a JSON object with
//! the final file path and metadata once the file has been moved into place
//! (`--print after_move:...`).

use lazy_regex::regex_replace;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::core::error::DownloadError;
use super::fetcher::{FetchProgress, FetchRequest, FetchStatus, FetchedMedia, MediaFetcher, MediaMetadata};
use super::temp;
use crate::core::config;
use crate::core::process::{run_streaming, Stream};

/// Marker that starts every progress line we ask yt-dlp for
const PROGRESS_MARKER: &str = "riffgrab-progress:";

const PROGRESS_TEMPLATE: &str = "download:riffgrab-progress:%(progress.status)s:%(progress.downloaded_bytes)s:%(progress.total_bytes)s:%(progress.total_bytes_estimate)s";

const PRINT_TEMPLATE: &str = "after_move:%(.{filepath,title,duration,uploader,extractor})j";

/// Longest error text passed on to the user
const MAX_ERROR_LEN: usize = 300;

#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    bin: String,
    cookies_path: Option<PathBuf>,
    concurrent_fragments: u32,
    timeout: Duration,
}

impl YtDlpFetcher {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            cookies_path: None,
            concurrent_fragments: 1,
            timeout,
        }
    }

    /// Fetcher for the configured binary, cookies file and fragment count
    pub fn from_config() -> Self {
        Self::new(config::YTDL_BIN.as_str(), config::download::ytdlp_timeout())
            .with_cookies(config::COOKIES_PATH.clone())
            .with_concurrent_fragments(*config::download::CONCURRENT_FRAGMENTS)
    }

    /// Cookie file passed with `--cookies` whenever it exists at fetch time
    pub fn with_cookies(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    pub fn with_concurrent_fragments(mut self, n: u32) -> Self {
        self.concurrent_fragments = n.max(1);
        self
    }

    fn existing_cookies(&self) -> Option<&Path> {
        self.cookies_path.as_deref().filter(|p| p.exists())
    }

    /// Full argument list for one fetch
    pub fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let template = request
            .output_dir
            .join(format!("{}%(title)s.%(ext)s", request.artifact_prefix));

        let mut args: Vec<String> = vec![
            "--newline".into(),
            "--progress".into(),
            "--progress-template".into(),
            PROGRESS_TEMPLATE.into(),
            "--no-simulate".into(),
            "--print".into(),
            PRINT_TEMPLATE.into(),
            "--no-playlist".into(),
            "--no-part".into(),
            "-f".into(),
            "bestaudio/best".into(),
            "--concurrent-fragments".into(),
            self.concurrent_fragments.to_string(),
            "-o".into(),
            template.to_string_lossy().into_owned(),
        ];

        if let Some(cookies) = self.existing_cookies() {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().into_owned());
        }

        if let Some(bitrate) = &request.mp3_bitrate {
            args.extend([
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                bitrate.clone(),
            ]);
        }

        // Keep URLs starting with '-' from being read as options
        args.push("--".into());
        args.push(request.url.clone());
        args
    }
}

impl MediaFetcher for YtDlpFetcher {
    fn fetch(
        &self,
        request: &FetchRequest,
        on_progress: &mut dyn FnMut(FetchProgress),
    ) -> Result<FetchedMedia, DownloadError> {
        let args = self.build_args(request);
        log::info!("Running {} for {}", self.bin, request.url);
        log::debug!("yt-dlp args: {:?}", args);

        let mut printed: Option<PrintedInfo> = None;
        let mut cmd = Command::new(&self.bin);
        cmd.args(&args);

        let outcome = run_streaming(&mut cmd, self.timeout, &mut |stream, line| {
            if let Some(progress) = parse_progress_line(line) {
                on_progress(progress);
            } else if stream == Stream::Stdout {
                if let Some(info) = parse_printed_info(line) {
                    printed = Some(info);
                }
            }
        })?;

        if !outcome.success() {
            let message = user_facing_error(&outcome.stderr_tail)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", outcome.status));
            log::error!("yt-dlp failed for {}: {}", request.url, outcome.stderr_text());
            return Err(DownloadError::Exit(message));
        }

        resolve_media(request, printed)
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

/// Fields of the `after_move` JSON line
#[derive(Debug, Default, Deserialize)]
struct PrintedInfo {
    filepath: Option<PathBuf>,
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    extractor: Option<String>,
}

fn parse_printed_info(line: &str) -> Option<PrintedInfo> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(info) => Some(info),
        Err(e) => {
            log::debug!("Ignoring non-metadata JSON line from yt-dlp: {}", e);
            None
        }
    }
}

/// Picks the artifact path: the printed one when it exists, otherwise a prefix scan
fn resolve_media(request: &FetchRequest, printed: Option<PrintedInfo>) -> Result<FetchedMedia, DownloadError> {
    let info = printed.unwrap_or_default();

    let path = match info.filepath.filter(|p| p.exists()) {
        Some(path) => path,
        None => temp::find_artifact(&request.output_dir, &request.artifact_prefix)
            .map_err(|e| DownloadError::Other(format!("cannot scan {}: {}", request.output_dir.display(), e)))?
            .ok_or_else(|| DownloadError::OutputMissing(format!("no file for {}", request.url)))?,
    };

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| title_from_path(&path, &request.artifact_prefix));

    Ok(FetchedMedia {
        path,
        title,
        metadata: MediaMetadata {
            duration_secs: info.duration.filter(|d| d.is_finite() && *d >= 0.0).map(|d| d.round() as u32),
            uploader: info.uploader,
            extractor: info.extractor,
        },
    })
}

/// File stem without the artifact prefix
fn title_from_path(path: &Path, prefix: &str) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    stem.strip_prefix(prefix).map(str::to_string).unwrap_or(stem)
}

fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

/// Parses one line produced by the progress template.
///
/// yt-dlp prints `NA` for unknown fields; the exact total wins over the estimate.
pub fn parse_progress_line(line: &str) -> Option<FetchProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split(':');

    let status = match fields.next()? {
        "downloading" => FetchStatus::Downloading,
        "finished" => FetchStatus::Finished,
        _ => return None,
    };
    let downloaded_bytes = fields.next().and_then(parse_bytes).unwrap_or(0);
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(FetchProgress {
        status,
        downloaded_bytes,
        total_bytes: total.or(estimate),
    })
}

/// Reduces yt-dlp stderr to one line a user can read.
///
/// Takes the last `ERROR:` line and strips the prefix and the `[extractor] id:` tag.
pub fn user_facing_error(stderr_tail: &[String]) -> Option<String> {
    let line = stderr_tail
        .iter()
        .rev()
        .find_map(|l| l.trim().strip_prefix("ERROR:"))
        .or_else(|| stderr_tail.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty()))?;

    let cleaned = regex_replace!(r"^\s*\[[^\]]+\]\s*(?:[\w-]+:\s+)?", line, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let mut message: String = cleaned.chars().take(MAX_ERROR_LEN).collect();
    if cleaned.chars().count() > MAX_ERROR_LEN {
        message.push('…');
    }
    Some(message)
}

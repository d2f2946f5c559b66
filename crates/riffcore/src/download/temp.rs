//! Temp artifacts of a request.
//!
//! Every file a request produces lives in the temp directory and starts with
//! `"{requester_id}_"`, which is what teardown matches on.

use fs_err as fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bytes in one MiB
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Extensions tried, in order, when the fetcher did not report its output path
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "webm", "ogg", "aac", "flac", "wav", "mp4"];

/// `"{id}_"`
pub fn artifact_prefix(id: i64) -> String {
    format!("{}_", id)
}

/// File names in `dir` that belong to `prefix`, sorted
pub fn list_prefixed(dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(prefix) && entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Deletes every file in `dir` starting with `prefix`.
///
/// Individual failures are logged and skipped. Returns how many files were removed.
pub fn cleanup_prefixed(dir: &Path, prefix: &str) -> usize {
    let files = match list_prefixed(dir, prefix) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("Cannot list {} for cleanup: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for path in files {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed temp file {}", path.display());
                removed += 1;
            }
            Err(e) => log::warn!("Failed to remove temp file: {}", e),
        }
    }
    removed
}

/// Best guess for the artifact when the fetcher did not say where it wrote it.
///
/// Prefers audio extensions in [`AUDIO_EXTENSIONS`] order and ignores partial downloads.
pub fn find_artifact(dir: &Path, prefix: &str) -> io::Result<Option<PathBuf>> {
    let files: Vec<PathBuf> = list_prefixed(dir, prefix)?
        .into_iter()
        .filter(|p| {
            !p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "part" || e == "ytdl")
        })
        .collect();

    for wanted in AUDIO_EXTENSIONS {
        if let Some(path) = files.iter().find(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
        }) {
            return Ok(Some(path.clone()));
        }
    }
    Ok(files.into_iter().next())
}

/// File size in MiB
pub fn file_size_mib(path: &Path) -> io::Result<f64> {
    Ok(fs::metadata(path)?.len() as f64 / BYTES_PER_MIB)
}

/// `{dir}/{prefix}{stem}.mp3` next to the fetched file
pub fn mp3_path_for(input: &Path) -> PathBuf {
    input.with_extension("mp3")
}

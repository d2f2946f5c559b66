use thiserror::Error;

/// Centralized error type for one request
///
/// Every failure a request can run into ends up here, so the orchestration
/// boundary can log it and render it into the status message.
///
/// # Example
///
/// ```
/// use riffcore::core::error::AppError;
///
/// let err = AppError::SizeExceeded { size_mib: 60.0, limit_mib: 50.0 };
/// assert!(err.user_message().contains("60.00 MB"));
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Input does not look like an http(s) URL
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requester already has a job in flight
    #[error("A download is already in progress for requester {0}")]
    AlreadyInProgress(i64),

    /// Network or extraction failure reported by the fetcher
    #[error("Failed to download: {0}")]
    FetchFailure(DownloadError),

    /// Transcoder exited with an error or produced no output
    #[error("Failed to convert: {0}")]
    TranscodeFailure(DownloadError),

    /// Finished artifact is larger than the configured ceiling
    #[error("File too large: {size_mib:.2} MB (limit {limit_mib:.2} MB)")]
    SizeExceeded { size_mib: f64, limit_mib: f64 },

    /// The chat API refused to send the result
    #[error("Failed to deliver: {0}")]
    Delivery(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failure of an external tool run (`yt-dlp`, `ffmpeg`).
///
/// The pipeline wraps it into `AppError::FetchFailure` or
/// `AppError::TranscodeFailure`.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The binary could not be started (missing, not executable)
    #[error("failed to start process: {0}")]
    Spawn(String),
    /// The process exited with a non-zero status; carries the cleaned-up error line
    #[error("{0}")]
    Exit(String),
    /// The process exceeded its timeout and was killed
    #[error("{0}")]
    Timeout(String),
    /// The process succeeded but the expected output file is missing
    #[error("output file missing: {0}")]
    OutputMissing(String),
    /// Catch-all for uncategorized errors
    #[error("{0}")]
    Other(String),
}

impl DownloadError {
    /// Message that is safe to show in the chat.
    ///
    /// Spawn failures leak local paths, so they collapse to a generic text.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::Spawn(_) => "the downloader is not available right now".to_string(),
            DownloadError::Timeout(_) => "the operation took too long".to_string(),
            DownloadError::OutputMissing(_) => "no audio file was produced".to_string(),
            DownloadError::Exit(msg) | DownloadError::Other(msg) => msg.clone(),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short category name used in logs
    pub fn category(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::AlreadyInProgress(_) => "already_in_progress",
            AppError::FetchFailure(_) => "fetch",
            AppError::TranscodeFailure(_) => "transcode",
            AppError::SizeExceeded { .. } => "size_exceeded",
            AppError::Delivery(_) => "delivery",
            AppError::Io(_) => "io",
            AppError::Join(_) => "join",
        }
    }

    /// Text shown to the user in place of the progress bar.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(_) => "Please send a valid video link (e.g., YouTube).".to_string(),
            AppError::AlreadyInProgress(_) => {
                "You already have a download in progress. Please wait for it to finish.".to_string()
            }
            AppError::FetchFailure(e) => format!("Failed to download: {}", e.user_message()),
            AppError::TranscodeFailure(e) => format!("Failed to convert to MP3: {}", e.user_message()),
            AppError::SizeExceeded { size_mib, limit_mib } => format!(
                "File is too large ({:.2} MB). Maximum size is {:.2} MB.",
                size_mib, limit_mib
            ),
            AppError::Delivery(msg) => format!("Failed to send the file: {}", msg),
            AppError::Io(_) | AppError::Join(_) => "Internal error, please try again later.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_exceeded_display() {
        let err = AppError::SizeExceeded {
            size_mib: 60.0,
            limit_mib: 50.0,
        };
        assert_eq!(err.to_string(), "File too large: 60.00 MB (limit 50.00 MB)");
        assert_eq!(err.category(), "size_exceeded");
    }

    #[test]
    fn test_fetch_failure_user_message() {
        let err = AppError::FetchFailure(DownloadError::Exit("Video unavailable".into()));
        assert_eq!(err.user_message(), "Failed to download: Video unavailable");
    }

    #[test]
    fn test_download_error_display() {
        let err = DownloadError::Exit("Video unavailable".into());
        assert_eq!(err.to_string(), "Video unavailable");

        let err = DownloadError::Spawn("No such file or directory".into());
        assert_eq!(err.to_string(), "failed to start process: No such file or directory");
    }

    #[test]
    fn test_spawn_failure_hides_local_paths() {
        let err = AppError::FetchFailure(DownloadError::Spawn("/usr/local/bin/yt-dlp: permission denied".into()));
        assert!(!err.user_message().contains("/usr/local"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Io(std::io::Error::other("disk on fire"));
        assert!(!err.user_message().contains("disk on fire"));
    }
}

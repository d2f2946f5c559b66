//! One request, end to end.
//!
//! validate URL -> create job -> status message + reporter -> fetch (and
//! transcode) on a blocking worker -> size check -> upload -> teardown.
//!
//! Teardown runs on every exit path: the reporter is stopped before the
//! status message is touched, the job is removed and every temp file with the
//! requester's prefix is deleted.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::validation::validate_media_url;
use crate::delivery::{AudioUpload, ChatDelivery, ChatRef, StatusMessageId};
use crate::download::fetcher::{FetchRequest, FetchStatus, FetchedMedia, MediaFetcher};
use crate::download::progress::{
    connecting_status, download_percent, downloading_status, error_status, format_caption, transcoding_status,
    uploading_status, CONVERTING_STATUS,
};
use crate::download::temp::{self, artifact_prefix, BYTES_PER_MIB};
use crate::download::transcode::{FfmpegTranscoder, Transcoder, TranscoderKind};
use crate::download::ytdlp::YtDlpFetcher;
use crate::jobs::reporter::{spawn_reporter, ReporterConfig, StatusMessage};
use crate::jobs::tracker::{JobHandle, JobTracker, RequesterId};

pub const INVALID_URL_TEXT: &str = "❌ Please send a valid video link (e.g., YouTube).";
pub const ALREADY_IN_PROGRESS_TEXT: &str = "⏳ You already have a download in progress. Please wait for it to finish.";

/// Tunables of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub temp_dir: PathBuf,
    /// Size ceiling in MiB, `None` for unlimited
    pub max_file_size_mib: Option<f64>,
    pub bitrate: String,
    pub reporter: ReporterConfig,
}

impl PipelineSettings {
    pub fn from_config() -> Self {
        Self {
            temp_dir: config::TEMP_FILES_DIR.clone(),
            max_file_size_mib: *config::download::MAX_FILE_SIZE_MB,
            bitrate: config::audio::BITRATE.clone(),
            reporter: ReporterConfig::default(),
        }
    }
}

/// What was delivered
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub title: String,
    pub elapsed_secs: f64,
    pub size_mib: f64,
}

/// Downloads the media and, when a transcoder is given and the file is not
/// MP3 yet, converts it next to the download.
///
/// Blocking. Status texts go to `on_status`.
pub fn fetch_and_transcode(
    fetcher: &dyn MediaFetcher,
    transcoder: Option<&dyn Transcoder>,
    request: &FetchRequest,
    bitrate: &str,
    on_status: &mut dyn FnMut(String),
) -> AppResult<FetchedMedia> {
    let mut media = fetcher
        .fetch(request, &mut |progress| match progress.status {
            FetchStatus::Downloading => on_status(downloading_status(download_percent(
                progress.downloaded_bytes,
                progress.total_bytes,
            ))),
            FetchStatus::Finished => on_status(CONVERTING_STATUS.to_string()),
        })
        .map_err(AppError::FetchFailure)?;

    if let Some(transcoder) = transcoder {
        if !media.is_mp3() {
            on_status(transcoding_status(bitrate));
            let output = temp::mp3_path_for(&media.path);
            transcoder
                .transcode(&media.path, &output, bitrate)
                .map_err(AppError::TranscodeFailure)?;
            if let Err(e) = fs_err::remove_file(&media.path) {
                log::debug!("Failed to remove transcoder input: {}", e);
            }
            media.path = output;
        }
    }
    Ok(media)
}

/// Request handler shared by every chat
#[derive(Clone)]
pub struct Pipeline {
    tracker: JobTracker,
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Option<Arc<dyn Transcoder>>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(tracker: JobTracker, fetcher: Arc<dyn MediaFetcher>, settings: PipelineSettings) -> Self {
        Self {
            tracker,
            fetcher,
            transcoder: None,
            settings,
        }
    }

    /// Converts with a separate step instead of the fetcher's own extraction
    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// yt-dlp fetcher, plus ffmpeg when TRANSCODER=ffmpeg
    pub fn from_config(tracker: JobTracker) -> Self {
        let pipeline = Self::new(tracker, Arc::new(YtDlpFetcher::from_config()), PipelineSettings::from_config());
        match *config::audio::TRANSCODER {
            TranscoderKind::Ffmpeg => pipeline.with_transcoder(Arc::new(FfmpegTranscoder::from_config())),
            TranscoderKind::Ytdlp => pipeline,
        }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Handles one inbound text from `requester`.
    ///
    /// Every failure has already been shown to the user when this returns; the
    /// error is returned for logging and tests.
    pub async fn handle_request(
        &self,
        requester: RequesterId,
        chat: ChatRef,
        text: &str,
        delivery: Arc<dyn ChatDelivery>,
    ) -> AppResult<DeliveryReport> {
        let url = match validate_media_url(text) {
            Ok(url) => url,
            Err(e) => {
                log::info!("Rejected input from {}: {}", requester, e);
                if let Err(e) = delivery.send_text(chat, INVALID_URL_TEXT).await {
                    log::debug!("Failed to send invalid-url reply: {}", e);
                }
                return Err(AppError::InvalidInput(e.to_string()));
            }
        };

        let job = match self.tracker.create(requester) {
            Ok(job) => job,
            Err(e) => {
                log::info!("{}", e);
                if let Err(e) = delivery.send_text(chat, ALREADY_IN_PROGRESS_TEXT).await {
                    log::debug!("Failed to send in-progress reply: {}", e);
                }
                return Err(AppError::AlreadyInProgress(requester.0));
            }
        };

        let initial = connecting_status();
        job.status_ref().set(initial.as_str());
        let status_message = match delivery.send_status(chat, &initial).await {
            Ok(id) => id,
            Err(e) => {
                log::error!("Failed to send status message to {}: {}", requester, e);
                job.finish();
                return Err(AppError::Delivery(e.to_string()));
            }
        };

        log::info!("Starting request from {} for {} via {}", requester, url, self.fetcher.name());
        let reporter = spawn_reporter(
            job.status_ref(),
            job.cancellation(),
            Arc::new(StatusMessage {
                delivery: delivery.clone(),
                chat,
                message: status_message,
            }),
            self.settings.reporter.clone(),
        );

        let result = self.run(&job, url.as_str(), chat, delivery.as_ref()).await;

        reporter.stop().await;
        self.teardown(job, chat, status_message, delivery.as_ref(), &result).await;

        match &result {
            Ok(report) => log::info!(
                "Delivered '{}' to {} ({:.2} MB in {:.1}s)",
                report.title,
                requester,
                report.size_mib,
                report.elapsed_secs
            ),
            Err(e) => log::error!("Request from {} failed [{}]: {}", requester, e.category(), e),
        }
        result
    }

    async fn run(
        &self,
        job: &JobHandle,
        url: &str,
        chat: ChatRef,
        delivery: &dyn ChatDelivery,
    ) -> AppResult<DeliveryReport> {
        let request = FetchRequest {
            url: url.to_string(),
            output_dir: self.settings.temp_dir.clone(),
            artifact_prefix: artifact_prefix(job.id().0),
            mp3_bitrate: self.transcoder.is_none().then(|| self.settings.bitrate.clone()),
        };

        let fetcher = Arc::clone(&self.fetcher);
        let transcoder = self.transcoder.clone();
        let bitrate = self.settings.bitrate.clone();
        let status = job.status_ref();
        let media = tokio::task::spawn_blocking(move || {
            fetch_and_transcode(
                fetcher.as_ref(),
                transcoder.as_deref(),
                &request,
                &bitrate,
                &mut |text: String| status.set(text),
            )
        })
        .await??;
        log::info!(
            "Fetched '{}' from {}",
            media.title,
            media.metadata.extractor.as_deref().unwrap_or("unknown source")
        );

        let size_mib = fs_err::tokio::metadata(&media.path).await?.len() as f64 / BYTES_PER_MIB;
        log::info!("Artifact {} is {:.2} MB", media.path.display(), size_mib);
        if let Some(limit_mib) = self.settings.max_file_size_mib {
            if size_mib > limit_mib {
                if let Err(e) = fs_err::tokio::remove_file(&media.path).await {
                    log::warn!("Failed to remove oversized file: {}", e);
                }
                return Err(AppError::SizeExceeded { size_mib, limit_mib });
            }
        }

        job.status_ref().set(uploading_status());
        let elapsed_secs = job.elapsed().unwrap_or_default().as_secs_f64();
        let caption = format_caption(&media.title, elapsed_secs, size_mib);
        delivery
            .send_audio(
                chat,
                AudioUpload {
                    path: &media.path,
                    title: &media.title,
                    caption: &caption,
                    duration_secs: media.metadata.duration_secs,
                    performer: media.metadata.uploader.as_deref(),
                },
            )
            .await
            .map_err(|e| AppError::Delivery(e.to_string()))?;

        Ok(DeliveryReport {
            title: media.title,
            elapsed_secs,
            size_mib,
        })
    }

    /// Runs after the reporter has stopped
    async fn teardown(
        &self,
        job: JobHandle,
        chat: ChatRef,
        status_message: StatusMessageId,
        delivery: &dyn ChatDelivery,
        result: &AppResult<DeliveryReport>,
    ) {
        let id = job.id();
        job.finish();

        match result {
            Ok(_) => {
                if let Err(e) = delivery.delete_status(chat, status_message).await {
                    log::debug!("Failed to delete status message for {}: {}", id, e);
                }
            }
            Err(err) => {
                let text = error_status(&err.user_message());
                if let Err(e) = delivery.edit_status(chat, status_message, &text).await {
                    log::debug!("Failed to show error in status message for {}: {}", id, e);
                    if let Err(e) = delivery.send_text(chat, &text).await {
                        log::warn!("Failed to report error to {}: {}", id, e);
                    }
                }
            }
        }

        let dir = self.settings.temp_dir.clone();
        let prefix = artifact_prefix(id.0);
        match tokio::task::spawn_blocking(move || temp::cleanup_prefixed(&dir, &prefix)).await {
            Ok(removed) => log::debug!("Removed {} temp file(s) for {}", removed, id),
            Err(e) => log::warn!("Temp cleanup for {} did not finish: {}", id, e),
        }
    }
}

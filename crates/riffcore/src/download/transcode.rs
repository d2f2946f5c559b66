//! MP3 transcoding with ffmpeg.

use std::path::Path;
use std::process::Command;
use std::time::Duration;
use strum::{Display, EnumString};

use crate::core::error::DownloadError;
use crate::core::config;
use crate::core::process::run_streaming;

/// Which tool produces the MP3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TranscoderKind {
    /// yt-dlp's own audio extraction post-processor
    #[default]
    Ytdlp,
    /// Separate ffmpeg step after the download
    Ffmpeg,
}

/// Converts a media file into MP3.
///
/// Implementations block; call them from `tokio::task::spawn_blocking`.
pub trait Transcoder: Send + Sync {
    fn transcode(&self, input: &Path, output: &Path, bitrate: &str) -> Result<(), DownloadError>;
}

/// Runs the ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    bin: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    /// FFMPEG_BIN with the standard timeout
    pub fn from_config() -> Self {
        Self::new(config::FFMPEG_BIN.as_str(), config::download::ffmpeg_timeout())
    }

    fn command(&self, input: &Path, output: &Path, bitrate: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-b:a")
            .arg(bitrate)
            .arg(output);
        cmd
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path, bitrate: &str) -> Result<(), DownloadError> {
        if !input.exists() {
            return Err(DownloadError::OutputMissing(input.display().to_string()));
        }

        log::info!("Transcoding {} -> {} at {}", input.display(), output.display(), bitrate);
        let mut cmd = self.command(input, output, bitrate);
        let outcome = run_streaming(&mut cmd, self.timeout, &mut |_, _| {})?;

        if !outcome.success() {
            let reason = outcome
                .stderr_tail
                .iter()
                .rev()
                .find(|l| !l.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("ffmpeg exited with {}", outcome.status));
            log::error!("FFmpeg conversion error: {}", outcome.stderr_text());
            return Err(DownloadError::Exit(reason));
        }

        if !output.exists() {
            return Err(DownloadError::OutputMissing(output.display().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transcoder_kind_parse() {
        assert_eq!("ytdlp".parse::<TranscoderKind>().unwrap(), TranscoderKind::Ytdlp);
        assert_eq!("FFmpeg".parse::<TranscoderKind>().unwrap(), TranscoderKind::Ffmpeg);
        assert!("sox".parse::<TranscoderKind>().is_err());
        assert_eq!(TranscoderKind::default(), TranscoderKind::Ytdlp);
        assert_eq!(TranscoderKind::Ffmpeg.to_string(), "ffmpeg");
    }

    #[test]
    fn test_command_args() {
        let t = FfmpegTranscoder::new("ffmpeg", Duration::from_secs(1));
        let cmd = t.command(Path::new("/tmp/1_a.webm"), Path::new("/tmp/1_a.mp3"), "192k");
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-i",
                "/tmp/1_a.webm",
                "-vn",
                "-acodec",
                "libmp3lame",
                "-b:a",
                "192k",
                "/tmp/1_a.mp3"
            ]
        );
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let t = FfmpegTranscoder::new("ffmpeg", Duration::from_secs(1));
        let result = t.transcode(&dir.path().join("nope.webm"), &dir.path().join("out.mp3"), "192k");
        assert!(matches!(result, Err(DownloadError::OutputMissing(_))));
    }

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("1_a.webm");
        std::fs::write(&input, b"data").unwrap();
        let bin = fake_ffmpeg(dir.path(), "echo 'Invalid data found when processing input' >&2; exit 1");

        let t = FfmpegTranscoder::new(bin, Duration::from_secs(10));
        let err = t.transcode(&input, &dir.path().join("1_a.mp3"), "192k").unwrap_err();
        assert_eq!(err.to_string(), "Invalid data found when processing input");
    }

    #[cfg(unix)]
    #[test]
    fn test_success_without_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("1_a.webm");
        std::fs::write(&input, b"data").unwrap();
        let bin = fake_ffmpeg(dir.path(), "exit 0");

        let t = FfmpegTranscoder::new(bin, Duration::from_secs(10));
        let result = t.transcode(&input, &dir.path().join("1_a.mp3"), "192k");
        assert!(matches!(result, Err(DownloadError::OutputMissing(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("1_a.webm");
        std::fs::write(&input, b"data").unwrap();
        // Last argument is the output path
        let bin = fake_ffmpeg(dir.path(), "for last; do :; done; echo mp3 > \"$last\"");

        let t = FfmpegTranscoder::new(bin, Duration::from_secs(10));
        let output = dir.path().join("1_a.mp3");
        t.transcode(&input, &output, "192k").unwrap();
        assert!(output.exists());
    }
}

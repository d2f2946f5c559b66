//! Mock fetcher and transcoder
//!
//! The fetcher writes a sparse file of the configured size into the request's
//! output directory, so size checks and prefix cleanup see a real artifact.

#![allow(dead_code)]

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use riffcore::download::{
    DownloadError, FetchProgress, FetchRequest, FetchedMedia, MediaFetcher, MediaMetadata, Transcoder,
};
use riffcore::jobs::{JobTracker, RequesterId};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MockFetcherConfig {
    pub title: String,
    pub extension: String,
    pub size_mib: u64,
    /// Progress events emitted before the file appears
    pub events: Vec<FetchProgress>,
    /// Fail after emitting events (a partial file is left behind)
    pub fail_with: Option<String>,
}

impl Default for MockFetcherConfig {
    fn default() -> Self {
        Self {
            title: "Test Song".to_string(),
            extension: "mp3".to_string(),
            size_mib: 10,
            events: vec![
                FetchProgress::downloading(50, Some(100)),
                FetchProgress::downloading(100, Some(100)),
                FetchProgress::finished(100),
            ],
            fail_with: None,
        }
    }
}

pub struct MockFetcher {
    config: MockFetcherConfig,
    /// Job whose status is sampled after every progress event
    observe: Option<(JobTracker, RequesterId)>,
    observed: Mutex<Vec<String>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MockFetcher {
    pub fn new(config: MockFetcherConfig) -> Self {
        Self {
            config,
            observe: None,
            observed: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn observing(mut self, tracker: JobTracker, id: RequesterId) -> Self {
        self.observe = Some((tracker, id));
        self
    }

    /// Job status right after each progress event
    pub fn observed(&self) -> Vec<String> {
        self.observed.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn write_artifact(&self, dir: &Path, name: &str, size_mib: u64) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_len(size_mib * MIB).unwrap();
        path
    }
}

impl MediaFetcher for MockFetcher {
    fn fetch(
        &self,
        request: &FetchRequest,
        on_progress: &mut dyn FnMut(FetchProgress),
    ) -> Result<FetchedMedia, DownloadError> {
        self.requests.lock().unwrap().push(request.clone());

        for event in &self.config.events {
            on_progress(*event);
            if let Some((tracker, id)) = &self.observe {
                if let Some(status) = tracker.status(*id) {
                    self.observed.lock().unwrap().push(status);
                }
            }
        }

        if let Some(message) = &self.config.fail_with {
            self.write_artifact(
                &request.output_dir,
                &format!("{}{}.webm.part", request.artifact_prefix, self.config.title),
                1,
            );
            return Err(DownloadError::Exit(message.clone()));
        }

        let path = self.write_artifact(
            &request.output_dir,
            &format!("{}{}.{}", request.artifact_prefix, self.config.title, self.config.extension),
            self.config.size_mib,
        );
        Ok(FetchedMedia {
            path,
            title: self.config.title.clone(),
            metadata: MediaMetadata {
                duration_secs: Some(180),
                uploader: Some("Test Artist".to_string()),
                extractor: Some("mock".to_string()),
            },
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Transcoder that copies the input to the output path
#[derive(Default)]
pub struct CopyTranscoder {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
}

impl Transcoder for CopyTranscoder {
    fn transcode(&self, input: &Path, output: &Path, bitrate: &str) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(bitrate.to_string());
        if self.fail {
            return Err(DownloadError::Exit("Invalid data found when processing input".to_string()));
        }
        std::fs::copy(input, output).map_err(|e| DownloadError::Other(e.to_string()))?;
        Ok(())
    }
}

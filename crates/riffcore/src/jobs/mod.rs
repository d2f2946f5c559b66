//! In-flight job registry and its progress animation

pub mod reporter;
pub mod tracker;

pub use reporter::{render_frame, spawn_reporter, ReporterConfig, ReporterHandle, StatusMessage, StatusSink, FRAMES};
pub use tracker::{JobError, JobHandle, JobStatus, JobToken, JobTracker, RequesterId, INITIAL_STATUS};

//! Registry of in-flight jobs, keyed by requester.
//!
//! The worker thread writes status text, the reporter task reads it. Only one
//! text field is shared, so last-write-wins is all the consistency needed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Status text a job starts with
pub const INITIAL_STATUS: &str = "⏳ Working...";

/// Identity of whoever sent the request (the Telegram user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequesterId(pub i64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique token of one job incarnation.
///
/// Two jobs for the same requester never share a token, so a stale worker
/// cannot write into (or tear down) a newer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobToken(Uuid);

impl JobToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job for requester {0} is already in progress")]
    AlreadyInProgress(RequesterId),
    #[error("no job for requester {0}")]
    NotFound(RequesterId),
}

#[derive(Debug)]
struct JobEntry {
    token: JobToken,
    status_text: String,
    started_at: Instant,
    cancel: CancellationToken,
}

/// Thread-safe registry of in-flight jobs.
///
/// Cheap to clone; all clones share the same map. Construct one at startup and
/// hand it to whoever needs it.
#[derive(Clone, Default)]
pub struct JobTracker {
    jobs: Arc<DashMap<RequesterId, JobEntry>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job for `id`.
    ///
    /// Fails with [`JobError::AlreadyInProgress`] when the requester already has one.
    pub fn create(&self, id: RequesterId) -> Result<JobHandle, JobError> {
        let token = JobToken::new();
        let cancel = CancellationToken::new();
        match self.jobs.entry(id) {
            Entry::Occupied(_) => return Err(JobError::AlreadyInProgress(id)),
            Entry::Vacant(slot) => {
                slot.insert(JobEntry {
                    token,
                    status_text: INITIAL_STATUS.to_string(),
                    started_at: Instant::now(),
                    cancel: cancel.clone(),
                });
            }
        }
        // Shard lock is released here; len() locks every shard
        log::debug!("Job created for requester {} ({} in flight)", id, self.jobs.len());
        Ok(JobHandle {
            tracker: self.clone(),
            id,
            token,
            cancel,
            finished: false,
        })
    }

    /// Overwrites the status text of the job for `id`.
    ///
    /// Returns [`JobError::NotFound`] if the job is already gone; callers that
    /// race with teardown should ignore it.
    pub fn set_status(&self, id: RequesterId, text: impl Into<String>) -> Result<(), JobError> {
        match self.jobs.get_mut(&id) {
            Some(mut entry) => {
                entry.status_text = text.into();
                Ok(())
            }
            None => Err(JobError::NotFound(id)),
        }
    }

    /// Current status text, if the job exists
    pub fn status(&self, id: RequesterId) -> Option<String> {
        self.jobs.get(&id).map(|entry| entry.status_text.clone())
    }

    /// Time since the job was created
    pub fn elapsed(&self, id: RequesterId) -> Option<Duration> {
        self.jobs.get(&id).map(|entry| entry.started_at.elapsed())
    }

    /// Removes the job and cancels its reporter. Removing an absent id is a no-op.
    pub fn remove(&self, id: RequesterId) {
        if let Some((_, entry)) = self.jobs.remove(&id) {
            entry.cancel.cancel();
            log::debug!("Job removed for requester {}", id);
        }
    }

    pub fn exists(&self, id: RequesterId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Number of jobs in flight
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn set_status_if(&self, id: RequesterId, token: JobToken, text: String) -> Result<(), JobError> {
        match self.jobs.get_mut(&id) {
            Some(mut entry) if entry.token == token => {
                entry.status_text = text;
                Ok(())
            }
            _ => Err(JobError::NotFound(id)),
        }
    }

    fn status_if(&self, id: RequesterId, token: JobToken) -> Option<String> {
        self.jobs
            .get(&id)
            .filter(|entry| entry.token == token)
            .map(|entry| entry.status_text.clone())
    }

    fn elapsed_if(&self, id: RequesterId, token: JobToken) -> Option<Duration> {
        self.jobs
            .get(&id)
            .filter(|entry| entry.token == token)
            .map(|entry| entry.started_at.elapsed())
    }

    fn remove_if(&self, id: RequesterId, token: JobToken) {
        if let Some((_, entry)) = self.jobs.remove_if(&id, |_, entry| entry.token == token) {
            entry.cancel.cancel();
            log::debug!("Job finished for requester {}", id);
        }
    }
}

/// Ownership of one job.
///
/// Every write goes through the job's own token. Dropping the handle removes
/// the job, so the entry cannot outlive the request on any exit path.
#[derive(Debug)]
pub struct JobHandle {
    tracker: JobTracker,
    id: RequesterId,
    token: JobToken,
    cancel: CancellationToken,
    finished: bool,
}

impl fmt::Debug for JobTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobTracker").field("jobs", &self.jobs.len()).finish()
    }
}

impl JobHandle {
    pub fn id(&self) -> RequesterId {
        self.id
    }

    pub fn token(&self) -> JobToken {
        self.token
    }

    /// Token cancelled when the job is removed from the tracker
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Overwrites this job's status text. Errors if the job was already torn down.
    pub fn set_status(&self, text: impl Into<String>) -> Result<(), JobError> {
        self.tracker.set_status_if(self.id, self.token, text.into())
    }

    /// Current status text of this job
    pub fn status(&self) -> Option<String> {
        self.tracker.status_if(self.id, self.token)
    }

    /// Time since this job was created, `None` once it was torn down
    pub fn elapsed(&self) -> Option<Duration> {
        self.tracker.elapsed_if(self.id, self.token)
    }

    /// A cloneable, `Send` view of this job's status for the worker and reporter.
    pub fn status_ref(&self) -> JobStatus {
        JobStatus {
            tracker: self.tracker.clone(),
            id: self.id,
            token: self.token,
        }
    }

    /// Removes the job from the tracker and stops its reporter.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.finished {
            self.finished = true;
            self.tracker.remove_if(self.id, self.token);
            // The entry may already be gone via `JobTracker::remove`
            self.cancel.cancel();
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Status view handed to the worker thread and the reporter task.
///
/// Writes after teardown are dropped and logged at trace: the worker may still be
/// reporting progress when the job is removed.
#[derive(Debug, Clone)]
pub struct JobStatus {
    tracker: JobTracker,
    id: RequesterId,
    token: JobToken,
}

impl JobStatus {
    pub fn id(&self) -> RequesterId {
        self.id
    }

    /// Current text, `None` once the job is gone
    pub fn get(&self) -> Option<String> {
        self.tracker.status_if(self.id, self.token)
    }

    pub fn set(&self, text: impl Into<String>) {
        if self.tracker.set_status_if(self.id, self.token, text.into()).is_err() {
            log::trace!("Dropped status update for finished job {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_sets_initial_status() {
        let tracker = JobTracker::new();
        let handle = tracker.create(RequesterId(1)).unwrap();
        assert!(tracker.exists(RequesterId(1)));
        assert_eq!(tracker.status(RequesterId(1)).as_deref(), Some(INITIAL_STATUS));
        assert_eq!(handle.status().as_deref(), Some(INITIAL_STATUS));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_second_create_is_rejected() {
        let tracker = JobTracker::new();
        let _first = tracker.create(RequesterId(1)).unwrap();
        assert_eq!(
            tracker.create(RequesterId(1)).unwrap_err(),
            JobError::AlreadyInProgress(RequesterId(1))
        );
        // Other requesters are independent
        assert!(tracker.create(RequesterId(2)).is_ok());
    }

    #[test]
    fn test_set_status_and_not_found() {
        let tracker = JobTracker::new();
        let _handle = tracker.create(RequesterId(5)).unwrap();
        tracker.set_status(RequesterId(5), "📥 Downloading...").unwrap();
        assert_eq!(tracker.status(RequesterId(5)).as_deref(), Some("📥 Downloading..."));
        assert_eq!(
            tracker.set_status(RequesterId(6), "nope"),
            Err(JobError::NotFound(RequesterId(6)))
        );
    }

    #[test]
    fn test_remove_is_idempotent_and_cancels() {
        let tracker = JobTracker::new();
        let handle = tracker.create(RequesterId(3)).unwrap();
        let cancel = handle.cancellation();
        tracker.remove(RequesterId(3));
        tracker.remove(RequesterId(3));
        assert!(!tracker.exists(RequesterId(3)));
        assert!(cancel.is_cancelled());
        assert!(handle.set_status("late").is_err());
    }

    #[test]
    fn test_drop_removes_job() {
        let tracker = JobTracker::new();
        {
            let _handle = tracker.create(RequesterId(9)).unwrap();
            assert!(tracker.exists(RequesterId(9)));
        }
        assert!(!tracker.exists(RequesterId(9)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_stale_handle_cannot_touch_new_job() {
        let tracker = JobTracker::new();
        let old = tracker.create(RequesterId(4)).unwrap();
        let old_status = old.status_ref();
        let old_cancel = old.cancellation();

        tracker.remove(RequesterId(4));
        let new = tracker.create(RequesterId(4)).unwrap();
        assert!(old_cancel.is_cancelled());
        assert!(!new.cancellation().is_cancelled());

        old_status.set("stale progress");
        assert_eq!(new.status().as_deref(), Some(INITIAL_STATUS));

        // Finishing the old handle must leave the new job alone
        old.finish();
        assert!(tracker.exists(RequesterId(4)));
        assert!(!new.cancellation().is_cancelled());

        new.finish();
        assert!(!tracker.exists(RequesterId(4)));
    }

    #[test]
    fn test_elapsed_counts_from_creation() {
        let tracker = JobTracker::new();
        let handle = tracker.create(RequesterId(8)).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(handle.elapsed().unwrap() >= Duration::from_millis(20));
        assert!(tracker.elapsed(RequesterId(8)).unwrap() >= Duration::from_millis(20));

        handle.finish();
        assert_eq!(tracker.elapsed(RequesterId(8)), None);
    }

    #[test]
    fn test_status_ref_from_other_thread() {
        let tracker = JobTracker::new();
        let handle = tracker.create(RequesterId(8)).unwrap();
        let writer = handle.status_ref();
        std::thread::spawn(move || writer.set("🔄 Converting to MP3..."))
            .join()
            .unwrap();
        assert_eq!(handle.status().as_deref(), Some("🔄 Converting to MP3..."));
    }
}

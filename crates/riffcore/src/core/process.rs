//! Blocking process execution with a deadline
//!
//! Runs external tools (yt-dlp, ffmpeg) on the calling thread, streaming their
//! output line by line to a callback. Must only be called from a blocking
//! worker (`tokio::task::spawn_blocking`), never from the async runtime.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::core::error::DownloadError;

/// How many trailing stderr lines are kept for error analysis
const STDERR_TAIL_LINES: usize = 200;

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Result of a finished process
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: ExitStatus,
    /// Last lines written to stderr, oldest first
    pub stderr_tail: Vec<String>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stderr_text(&self) -> String {
        self.stderr_tail.join("\n")
    }
}

fn pump<R: Read + Send + 'static>(reader: R, stream: Stream, tx: mpsc::Sender<(Stream, String)>) {
    std::thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            match line {
                Ok(line) => {
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("Stopped reading {:?}: {}", stream, e);
                    break;
                }
            }
        }
    });
}

/// Run a command to completion, handing every output line to `on_line`.
///
/// The child is killed once `timeout` elapses. Both pipes are read on helper
/// threads so a silent process cannot stall the deadline check.
pub fn run_streaming(
    cmd: &mut Command,
    timeout: Duration,
    on_line: &mut dyn FnMut(Stream, &str),
) -> Result<ProcessOutcome, DownloadError> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            log::error!("Failed to spawn {}: {}", program, e);
            DownloadError::Spawn(format!("{}: {}", program, e))
        })?;

    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        pump(stdout, Stream::Stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        pump(stderr, Stream::Stderr, tx.clone());
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    let timed_out = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((stream, line)) => {
                if stream == Stream::Stderr {
                    log::debug!("{} stderr: {}", program, line);
                    if stderr_tail.len() == STDERR_TAIL_LINES {
                        stderr_tail.pop_front();
                    }
                    stderr_tail.push_back(line.clone());
                }
                on_line(stream, &line);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => break true,
            // Both pipes closed: the process is exiting
            Err(mpsc::RecvTimeoutError::Disconnected) => break false,
        }
    };

    let status = if timed_out {
        None
    } else {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if Instant::now() >= deadline => break None,
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DownloadError::Other(format!("{} wait failed: {}", program, e)));
                }
            }
        }
    };

    match status {
        Some(status) => Ok(ProcessOutcome {
            status,
            stderr_tail: stderr_tail.into(),
        }),
        None => {
            log::error!("{} timed out after {}s, killing", program, timeout.as_secs());
            let _ = child.kill();
            // Reap the zombie
            let _ = child.wait();
            Err(DownloadError::Timeout(format!(
                "{} timed out after {}s",
                program,
                timeout.as_secs()
            )))
        }
    }
}

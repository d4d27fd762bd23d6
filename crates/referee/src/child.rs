//! Subprocess plumbing shared by the engine and the emulator.

use std::io::{self, BufRead, BufReader, Read};
use std::process::Child;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use bridge_core::{BridgeError, Deadline, Result};
use tracing::{debug, warn};

/// Receive slice; the deadline further caps it.
const RECV_SLICE: Duration = Duration::from_millis(100);

/// Lines from a child's stdout, drained by a background thread so reads can
/// honour a [`Deadline`].
pub struct LineReader {
    source: &'static str,
    rx: Receiver<io::Result<String>>,
}

impl LineReader {
    pub fn spawn<R: Read + Send + 'static>(source: &'static str, stream: R) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("{source}-stdout"))
            .spawn(move || {
                for line in BufReader::new(stream).lines() {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self { source, rx })
    }

    /// Next line, or `StallTimeout` once `deadline` passes.
    pub fn next_line(&self, deadline: &Deadline) -> Result<String> {
        loop {
            deadline.check()?;
            match self.rx.recv_timeout(deadline.slice(RECV_SLICE)) {
                Ok(Ok(line)) => return Ok(line),
                Ok(Err(e)) => return Err(e.into()),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(BridgeError::collaborator(
                        self.source,
                        "process closed its output",
                    ))
                }
            }
        }
    }
}

/// Kill and reap a child, logging instead of failing: this runs on every
/// exit path, including the fatal ones.
pub fn kill_child(name: &str, child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(name, %status, "process already exited");
            return;
        }
        Ok(None) => {}
        Err(e) => warn!(name, error = %e, "could not query process state"),
    }
    if let Err(e) = child.kill() {
        warn!(name, error = %e, "failed to kill process");
    }
    match child.wait() {
        Ok(status) => debug!(name, %status, "process terminated"),
        Err(e) => warn!(name, error = %e, "failed to reap process"),
    }
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod child_tests;

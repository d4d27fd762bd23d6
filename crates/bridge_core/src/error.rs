//! Error kinds shared by every layer of the referee.
//!
//! None of these are retried: the only feedback channel is a text screen, so a
//! half-finished keystroke sequence can never be detected or undone reliably.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The VRAM dump never appeared (or never grew large enough) before the
    /// deadline of the wait that asked for it.
    #[error("screen snapshot {path} unavailable after {waited:?}")]
    SnapshotUnavailable { path: PathBuf, waited: Duration },

    /// On-screen move text that matches none of the known shapes.
    #[error("cannot parse on-screen move notation {text:?}")]
    UnparsableNotation { text: String },

    /// A blocking wait exceeded its watchdog budget.
    #[error("{what} stalled: no progress within {budget:?}")]
    StallTimeout { what: &'static str, budget: Duration },

    /// The engine, the emulator or the rules engine reported an error.
    #[error("{collaborator} failed: {reason}")]
    CollaboratorFailure {
        collaborator: &'static str,
        reason: String,
    },

    #[error("opening book {path}, entry {line}: {reason}")]
    Book {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn collaborator(collaborator: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::CollaboratorFailure {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Whether this error comes from a watchdog firing rather than from a
    /// collaborator misbehaving.
    pub fn is_stall(&self) -> bool {
        matches!(
            self,
            BridgeError::StallTimeout { .. } | BridgeError::SnapshotUnavailable { .. }
        )
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

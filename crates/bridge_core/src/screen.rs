//! Screen Buffer Reader: raw text-mode snapshots of the MSX display.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::trace;

use crate::deadline::Deadline;
use crate::error::{BridgeError, Result};

/// Text rows in SCREEN 1 (32 column) mode.
pub const ROWS: usize = 24;
/// Characters per row.
pub const COLS: usize = 32;
/// Offset of the pattern name table inside the VRAM dump.
pub const NAME_TABLE_OFFSET: usize = 0x3800;
/// Bytes in one name table.
pub const NAME_TABLE_LEN: usize = ROWS * COLS;

/// One captured screen: `ROWS` rows of `COLS` raw character codes.
#[derive(Clone, PartialEq, Eq)]
pub struct ScreenGrid {
    cells: [[u8; COLS]; ROWS],
}

impl ScreenGrid {
    /// An all-blank screen.
    pub fn blank() -> Self {
        Self {
            cells: [[b' '; COLS]; ROWS],
        }
    }

    /// Build a grid from a name table. Returns None if `bytes` is too short.
    pub fn from_name_table(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < NAME_TABLE_LEN {
            return None;
        }
        let mut grid = Self::blank();
        for (row, chunk) in bytes[..NAME_TABLE_LEN].chunks_exact(COLS).enumerate() {
            grid.cells[row].copy_from_slice(chunk);
        }
        Some(grid)
    }

    /// Build a grid from a full VRAM dump (the name table sits at
    /// [`NAME_TABLE_OFFSET`]).
    pub fn from_vram(dump: &[u8]) -> Option<Self> {
        dump.get(NAME_TABLE_OFFSET..)
            .and_then(Self::from_name_table)
    }

    /// Return a copy with `text` written at (`row`, `col`), clipped at the
    /// right edge. Handy for composing screens by hand.
    pub fn with_text(mut self, row: usize, col: usize, text: &str) -> Self {
        if row < ROWS {
            for (i, b) in text.bytes().enumerate() {
                let c = col + i;
                if c >= COLS {
                    break;
                }
                self.cells[row][c] = b;
            }
        }
        self
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row]
    }

    /// Character code at (`row`, `col`); blank outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(b' ')
    }

    /// Text of `row` between `start` and `end` columns, lossily decoded.
    pub fn text(&self, row: usize, start: usize, end: usize) -> String {
        let Some(r) = self.cells.get(row) else {
            return String::new();
        };
        let end = end.min(COLS);
        let start = start.min(end);
        String::from_utf8_lossy(&r[start..end]).into_owned()
    }
}

impl Default for ScreenGrid {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Display for ScreenGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            writeln!(f, "{:2}|{}|", i, String::from_utf8_lossy(row))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScreenGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScreenGrid\n{self}")
    }
}

/// Anything that can hand out fresh screen captures.
pub trait ScreenSource {
    /// Block (polling) until a capture is available, or fail once `deadline`
    /// passes.
    fn capture(&mut self, deadline: &Deadline) -> Result<ScreenGrid>;
}

/// Reads the VRAM image that the emulator's Tcl script dumps (and atomically
/// renames into place) on a fixed cadence.
#[derive(Debug, Clone)]
pub struct VramSnapshot {
    path: PathBuf,
    retry_interval: Duration,
}

impl VramSnapshot {
    pub fn new(path: impl Into<PathBuf>, retry_interval: Duration) -> Self {
        Self {
            path: path.into(),
            retry_interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_read(&self) -> Option<ScreenGrid> {
        // A missing or short file just means the first dump hasn't landed yet.
        let dump = fs::read(&self.path).ok()?;
        ScreenGrid::from_vram(&dump)
    }
}

impl ScreenSource for VramSnapshot {
    fn capture(&mut self, deadline: &Deadline) -> Result<ScreenGrid> {
        loop {
            if let Some(grid) = self.try_read() {
                return Ok(grid);
            }
            trace!(path = %self.path.display(), "snapshot not ready");
            if deadline.sleep(self.retry_interval).is_err() {
                return Err(BridgeError::SnapshotUnavailable {
                    path: self.path.clone(),
                    waited: deadline.elapsed(),
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod screen_tests;

//! The search-engine collaborator: a UCI engine in a subprocess.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use bridge_core::{BridgeError, Deadline, GameBoard, Move, Result};
use tracing::{debug, info};

use crate::child::{kill_child, LineReader};

/// Trait for anything that can pick our side's moves.
pub trait MoveProvider {
    /// Name used in the game record
    fn name(&self) -> &str;

    /// Reset internal state for a new game.
    fn new_game(&mut self, _deadline: &Deadline) -> Result<()> {
        Ok(())
    }

    /// Best move for the side to move, searching for about `move_time`.
    fn best_move(
        &mut self,
        board: &GameBoard,
        move_time: Duration,
        deadline: &Deadline,
    ) -> Result<Move>;

    /// Stop the engine. Called once at the end of every match.
    fn shutdown(&mut self) {}
}

/// UCI engine process.
pub struct UciEngine {
    name: String,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: LineReader,
    closed: bool,
}

impl UciEngine {
    /// Start the engine and complete the `uci` handshake.
    pub fn spawn(path: &Path, deadline: &Deadline) -> Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                BridgeError::collaborator("engine", format!("cannot start {}: {e}", path.display()))
            })?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let Some((stdin, stdout)) = pipes else {
            kill_child("engine", &mut child);
            return Err(BridgeError::collaborator("engine", "stdio pipes unavailable"));
        };
        let stdout = match LineReader::spawn("engine", stdout) {
            Ok(reader) => reader,
            Err(e) => {
                kill_child("engine", &mut child);
                return Err(e.into());
            }
        };

        let mut engine = Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "engine".to_string()),
            child,
            stdin: BufWriter::new(stdin),
            stdout,
            closed: false,
        };

        // From here on, Drop kills the process if the handshake fails.
        engine.send("uci")?;
        loop {
            let line = engine.stdout.next_line(deadline)?;
            if let Some(name) = line.trim().strip_prefix("id name ") {
                engine.name = name.trim().to_string();
            }
            if line.trim() == "uciok" {
                break;
            }
        }
        info!(engine = %engine.name, "engine ready");
        Ok(engine)
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!(target: "referee::engine::io", "> {command}");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Read lines until one starts with `token`.
    fn wait_for(&mut self, token: &str, deadline: &Deadline) -> Result<String> {
        loop {
            let line = self.stdout.next_line(deadline)?;
            debug!(target: "referee::engine::io", "< {line}");
            if line.trim_start().starts_with(token) {
                return Ok(line);
            }
        }
    }

    fn sync(&mut self, deadline: &Deadline) -> Result<()> {
        self.send("isready")?;
        self.wait_for("readyok", deadline)?;
        Ok(())
    }
}

impl MoveProvider for UciEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_game(&mut self, deadline: &Deadline) -> Result<()> {
        self.send("ucinewgame")?;
        self.sync(deadline)
    }

    fn best_move(
        &mut self,
        board: &GameBoard,
        move_time: Duration,
        deadline: &Deadline,
    ) -> Result<Move> {
        self.sync(deadline)?;
        self.send(&position_command(board))?;
        self.send(&format!("go movetime {}", move_time.as_millis()))?;
        let line = self.wait_for("bestmove", deadline)?;
        parse_bestmove(&line, board)
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Best effort: the process is killed right after either way.
        let _ = self.send("quit");
        kill_child("engine", &mut self.child);
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// `position startpos|fen <fen> [moves …]` for the board's history.
pub fn position_command(board: &GameBoard) -> String {
    let mut cmd = match board.start_fen() {
        Some(fen) => format!("position fen {fen}"),
        None => "position startpos".to_string(),
    };
    if !board.moves().is_empty() {
        cmd.push_str(" moves");
        for mv in board.moves() {
            cmd.push(' ');
            cmd.push_str(&mv.to_string());
        }
    }
    cmd
}

/// Parse `bestmove <move> [ponder <move>]`. The ponder move is ignored.
pub fn parse_bestmove(line: &str, board: &GameBoard) -> Result<Move> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return Err(BridgeError::collaborator(
            "engine",
            format!("expected bestmove, got {line:?}"),
        ));
    }
    let text = parts.next().unwrap_or("(none)");
    let mv: Move = text
        .parse()
        .map_err(|_| BridgeError::collaborator("engine", format!("no usable move in {line:?}")))?;
    if !board.is_legal(mv) {
        return Err(BridgeError::collaborator(
            "engine",
            format!("engine proposed illegal move {mv} in {}", board.fen()),
        ));
    }
    Ok(mv)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;

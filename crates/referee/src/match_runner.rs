//! Match driver: plays one game to the end and records it

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use bridge_core::{side_name, BridgeError, Color, GameBoard, Move, Outcome, Result};
use tracing::{error, info, warn};

use crate::pgn::{GameHeaders, GameRecord};
use crate::report::MatchReport;
use crate::synchronizer::{SyncState, TurnSynchronizer};

/// Where the finished game goes
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// PGN file the game is appended to
    pub pgn_file: PathBuf,
    /// Optional JSON report, written on success and on failure
    pub report_file: Option<PathBuf>,
    pub search_time_ms: u64,
    /// Print the move transcript to stdout
    pub transcript: bool,
}

/// Result of a completed game
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub outcome: Option<Outcome>,
    pub result: String,
    pub record: Vec<Move>,
}

/// Owns the authoritative board, the move record and the synchronizer.
pub struct MatchDriver {
    sync: TurnSynchronizer,
    board: GameBoard,
    record: Vec<Move>,
    settings: MatchSettings,
}

impl MatchDriver {
    pub fn new(sync: TurnSynchronizer, settings: MatchSettings) -> Self {
        Self {
            sync,
            board: GameBoard::new(),
            record: Vec::new(),
            settings,
        }
    }

    /// Start from a position other than the initial one.
    pub fn with_board(mut self, board: GameBoard) -> Self {
        self.board = board;
        self
    }

    /// Play the game. Both subprocesses are shut down before this returns,
    /// whatever the outcome.
    pub fn run(mut self) -> Result<MatchSummary> {
        let started = chrono::Local::now();
        let clock = Instant::now();

        let played = self.play();
        self.sync.shutdown();

        let report = MatchReport {
            engine: self.sync.engine_name().to_string(),
            msx_side: side_name(self.sync.msx_side()).to_string(),
            search_time_ms: self.settings.search_time_ms,
            started: started.to_rfc3339(),
            duration_secs: clock.elapsed().as_secs_f64(),
            result: self.board.result_tag().to_string(),
            outcome: self.board.outcome().map(|o| o.to_string()),
            error: played.as_ref().err().map(|e| e.to_string()),
            moves: self.record.iter().map(|m| m.to_string()).collect(),
        };
        self.save_report(&report);
        if self.settings.transcript {
            println!("{}", report.generate_report());
        }

        if let Err(e) = played {
            error!(error = %e, plies = self.record.len(), "match aborted");
            return Err(e);
        }

        self.save_pgn()?;
        let outcome = self.board.outcome();
        info!(result = self.board.result_tag(), plies = self.record.len(), "game over");
        Ok(MatchSummary {
            outcome,
            result: self.board.result_tag().to_string(),
            record: self.record,
        })
    }

    fn play(&mut self) -> Result<()> {
        self.sync.bootstrap(&self.board)?;

        while self.sync.state() != SyncState::GameOver {
            let side = self.board.side_to_move();
            let number = self.board.fullmove_number();

            let mv = self.sync.play_ply(&mut self.board)?;
            self.record.push(mv);
            if self.record.len() != self.board.ply_count() {
                return Err(BridgeError::collaborator(
                    "rules",
                    format!(
                        "move record has {} moves but the board has {} plies",
                        self.record.len(),
                        self.board.ply_count()
                    ),
                ));
            }

            if self.settings.transcript {
                print_transcript(side, number, mv, self.record.len() == 1);
            }
        }

        if self.settings.transcript && self.board.side_to_move() == Color::Black {
            println!();
        }
        Ok(())
    }

    /// Append the game to the PGN file, or print it if that fails.
    fn save_pgn(&self) -> Result<()> {
        let headers = GameHeaders::for_match(self.sync.engine_name(), self.sync.msx_side());
        let record = GameRecord::from_board(&self.board, headers)?;
        if let Err(e) = record.append_to(&self.settings.pgn_file) {
            warn!(
                path = %self.settings.pgn_file.display(),
                error = %e,
                "cannot append to PGN file, printing the game instead"
            );
            println!("{}\n", record.to_pgn());
        } else {
            info!(path = %self.settings.pgn_file.display(), "game saved");
        }
        Ok(())
    }

    fn save_report(&self, report: &MatchReport) {
        let Some(path) = &self.settings.report_file else {
            return;
        };
        match report.save(path) {
            Ok(()) => info!(path = %path.display(), "report saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save report"),
        }
    }
}

/// `12] e2e4 e7e5`, one line per move number.
fn print_transcript(side: Color, number: u16, mv: Move, first: bool) {
    match side {
        Color::White => print!("{number}] {mv} "),
        Color::Black if first => println!("{number}] ... {mv}"),
        Color::Black => println!("{mv}"),
    }
    let _ = std::io::stdout().flush();
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<MatchSummary>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
#[path = "match_runner_tests.rs"]
mod match_runner_tests;

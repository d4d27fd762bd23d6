//! Referee for UltraChess on openMSX
//!
//! This crate plays one game between a UCI engine and UltraChess, the MSX
//! chess program, and records it:
//! - Launching openMSX and the engine, and tearing both down again
//! - Typing moves and start-up answers on the emulated keyboard
//! - Reading UltraChess's moves off the VRAM text screen
//! - Writing the game as PGN and an optional JSON report
//!
//! # Usage
//!
//! ```bash
//! # Stockfish against UltraChess, 2 seconds per move, UltraChess as White
//! cargo run -p referee -- --engine /usr/games/stockfish -t 2000 --msx-side white
//!
//! # Settings from a file, with an opening book
//! cargo run -p referee -- --config referee.toml --book openings.txt
//! ```

pub mod book;
mod child;
pub mod cli;
pub mod config;
pub mod emulator;
pub mod engine;
pub mod keyboard;
pub mod logging;
pub mod match_runner;
pub mod pgn;
pub mod report;
pub mod synchronizer;

#[cfg(test)]
mod testing;

pub use book::OpeningBook;
pub use cli::Cli;
pub use config::{EmulatorSettings, RefereeConfig, SidePreference};
pub use engine::{MoveProvider, UciEngine};
pub use keyboard::{ControlLink, KeyboardDriver};
pub use match_runner::{exit_code, MatchDriver, MatchSettings, MatchSummary};
pub use pgn::{GameHeaders, GameRecord};
pub use report::MatchReport;
pub use synchronizer::{SyncState, Timing, TurnSynchronizer};

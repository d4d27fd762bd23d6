//! Core of the MSX chess referee.
//!
//! Everything here is independent of the subprocesses:
//! - `screen`: capturing the emulator's text screen from a VRAM dump
//! - `layout` / `interpreter`: reading prompts and moves off that screen
//! - `codec`: on-screen notation <-> board moves
//! - `board`: the authoritative game state (rules via cozy-chess)
//! - `deadline`: cooperative deadlines and the stall watchdog
//! - `polyglot`: opening-book keys and move encoding

pub mod board;
pub mod codec;
pub mod deadline;
pub mod error;
pub mod interpreter;
pub mod layout;
pub mod polyglot;
pub mod screen;

pub use board::{side_name, GameBoard, Outcome};
pub use codec::{to_board_move, to_screen_keystrokes, Keystrokes};
pub use deadline::{Deadline, Watchdog};
pub use error::{BridgeError, Result};
pub use interpreter::{interpret, Prompt, ScreenState, SideView};
pub use layout::Cue;
pub use polyglot::{polyglot_key, BookEntry};
pub use screen::{ScreenGrid, ScreenSource, VramSnapshot};

// The rules engine's vocabulary is part of this crate's API.
pub use cozy_chess::{Color, File, Move, Piece, Square};

//! Move Codec: on-screen notation <-> board moves.
//!
//! UltraChess prints moves as `e2-e4` and castling as `O-O` / `O-O-O`, and it
//! never names a promotion piece. Typing works the same way: origin square,
//! destination square, and the program works out castling and promotion from
//! the squares alone.

use std::fmt;
use std::str::FromStr;

use cozy_chess::{Color, Move, Piece, Square};

use crate::board::{last_rank, GameBoard};
use crate::error::{BridgeError, Result};

/// Decode on-screen move text for `side` against the current board.
///
/// A pawn reaching the last rank always promotes to a queen, whatever the
/// screen shows.
pub fn to_board_move(notation: &str, board: &GameBoard, side: Color) -> Result<Move> {
    let text = notation.trim().to_ascii_uppercase().replace('0', "O");

    if text.contains("O-O-O") {
        return Ok(castle(side, true));
    }
    if text.contains("O-O") {
        return Ok(castle(side, false));
    }

    let (from, to) = parse_squares(notation).ok_or_else(|| BridgeError::UnparsableNotation {
        text: notation.to_string(),
    })?;

    let promotion = match board.piece_on(from) {
        Some((owner, Piece::Pawn)) if owner == side && to.rank() == last_rank(side) => {
            Some(Piece::Queen)
        }
        _ => None,
    };
    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn castle(side: Color, long: bool) -> Move {
    let (from, to) = match (side, long) {
        (Color::White, false) => (Square::E1, Square::G1),
        (Color::White, true) => (Square::E1, Square::C1),
        (Color::Black, false) => (Square::E8, Square::G8),
        (Color::Black, true) => (Square::E8, Square::C8),
    };
    Move {
        from,
        to,
        promotion: None,
    }
}

/// `e2-e4`, `e2xe4`, `e2 e4` or `e2e4`, any case.
fn parse_squares(notation: &str) -> Option<(Square, Square)> {
    let compact: String = notation
        .trim()
        .to_ascii_lowercase()
        .chars()
        .enumerate()
        .filter(|&(i, c)| !(i == 2 && matches!(c, '-' | 'x' | ':' | ' ')))
        .map(|(_, c)| c)
        .collect();
    if compact.len() != 4 || !compact.is_ascii() {
        return None;
    }
    let from = Square::from_str(&compact[0..2]).ok()?;
    let to = Square::from_str(&compact[2..4]).ok()?;
    Some((from, to))
}

/// Keys to type for one move: origin pair, then destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystrokes {
    pub origin: Square,
    pub destination: Square,
}

impl Keystrokes {
    pub fn origin_text(&self) -> String {
        self.origin.to_string()
    }

    pub fn destination_text(&self) -> String {
        self.destination.to_string()
    }
}

impl fmt::Display for Keystrokes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}

/// Encode a board move for the on-screen input. Castling (king two squares)
/// and promotion need nothing extra.
pub fn to_screen_keystrokes(mv: Move) -> Keystrokes {
    Keystrokes {
        origin: mv.from,
        destination: mv.to,
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod codec_tests;

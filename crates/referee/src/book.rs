//! Opening book, looked up by Polyglot position key.
//!
//! Two formats load into the same index:
//! - Polyglot `.bin` books, such as the ones shipped with GNU Chess. Entries
//!   with weight 0 are skipped, the rest count equally.
//! - Text books: each non-empty line is one opening line played from the
//!   standard start position, e.g. `e2e4 e7e5 g1f3`. Everything after `#` is
//!   a comment. Every position reached along a line maps to the move the line
//!   plays next, so a position shared by several lines collects all of their
//!   continuations.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bridge_core::polyglot::{self, ENTRY_SIZE};
use bridge_core::{
    polyglot_key, BookEntry, BridgeError, File, GameBoard, Move, Piece, Result, Square,
};
use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct OpeningBook {
    /// Polyglot key -> distinct continuations, in file order
    entries: HashMap<u64, Vec<Move>>,
}

impl OpeningBook {
    /// Load a book; `.bin` files are read as Polyglot, anything else as text.
    pub fn load(path: &Path) -> Result<Self> {
        let is_polyglot = path.extension().is_some_and(|ext| ext == "bin");
        let book = if is_polyglot {
            Self::from_polyglot(&fs::read(path)?, path)?
        } else {
            Self::parse(&fs::read_to_string(path)?, path)?
        };
        info!(
            path = %path.display(),
            positions = book.len(),
            polyglot = is_polyglot,
            "opening book loaded"
        );
        Ok(book)
    }

    /// Read Polyglot records. `origin` only labels errors.
    pub fn from_polyglot(bytes: &[u8], origin: &Path) -> Result<Self> {
        let mut book = Self::default();

        for (index, record) in bytes.chunks(ENTRY_SIZE).enumerate() {
            let error = |reason: String| BridgeError::Book {
                path: origin.to_path_buf(),
                line: index + 1,
                reason,
            };
            let entry = BookEntry::from_bytes(record)
                .ok_or_else(|| error(format!("truncated record of {} bytes", record.len())))?;
            if entry.weight == 0 {
                continue;
            }
            let Some(mv) = polyglot::decode_move(entry.mv) else {
                debug!(raw = entry.mv, "skipping undecodable book move");
                continue;
            };
            book.insert(entry.key, mv);
        }

        Ok(book)
    }

    /// Parse book text. `origin` only labels errors.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut book = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let error = |reason: String| BridgeError::Book {
                path: origin.to_path_buf(),
                line: index + 1,
                reason,
            };

            let mut board = GameBoard::new();
            for token in line.split_whitespace() {
                let mv: Move = token
                    .parse()
                    .map_err(|_| error(format!("{token:?} is not a UCI move")))?;
                if !board.is_legal(mv) {
                    return Err(error(format!("{token} is illegal in {}", board.fen())));
                }
                book.insert(polyglot_key(&board), mv);
                board.apply(mv)?;
            }
        }

        Ok(book)
    }

    fn insert(&mut self, key: u64, mv: Move) {
        let candidates = self.entries.entry(key).or_default();
        if !candidates.contains(&mv) {
            candidates.push(mv);
        }
    }

    /// Legal book moves for the current position (empty when out of book).
    pub fn candidates(&self, board: &GameBoard) -> Vec<Move> {
        let Some(moves) = self.entries.get(&polyglot_key(board)) else {
            return Vec::new();
        };
        let mut legal = Vec::with_capacity(moves.len());
        for mv in moves.iter().map(|&mv| king_two_squares(board, mv)) {
            if board.is_legal(mv) && !legal.contains(&mv) {
                legal.push(mv);
            }
        }
        legal
    }

    /// Uniformly random choice among the candidates.
    pub fn pick(&self, board: &GameBoard, rng: &mut dyn RngCore) -> Option<Move> {
        self.candidates(board).choose(rng).copied()
    }

    /// Number of positions in the book
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Polyglot castles as king-takes-own-rook; the board wants e1g1 / e1c1.
fn king_two_squares(board: &GameBoard, mv: Move) -> Move {
    match (board.piece_on(mv.from), board.piece_on(mv.to)) {
        (Some((side, Piece::King)), Some((rook_side, Piece::Rook))) if side == rook_side => {
            let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
                File::G
            } else {
                File::C
            };
            Move {
                from: mv.from,
                to: Square::new(file, mv.from.rank()),
                promotion: None,
            }
        }
        _ => mv,
    }
}

#[cfg(test)]
#[path = "book_tests.rs"]
mod book_tests;

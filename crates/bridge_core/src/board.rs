//! The authoritative board: the single source of truth for the game.
//!
//! Rules come from `cozy-chess`. This wrapper adds what the referee needs on
//! top: the move list in standard UCI notation (king two squares for castling,
//! where cozy-chess uses king-takes-rook), repetition tracking, game outcome
//! and SAN for the transcript.

use std::collections::HashMap;
use std::fmt;

use cozy_chess::{BitBoard, Board, Color, File, GameStatus, Move, Piece, Rank, Square};

use crate::error::{BridgeError, Result};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    Repetition,
    InsufficientMaterial,
}

impl Outcome {
    /// PGN result token.
    pub fn result_tag(&self) -> &'static str {
        match self {
            Outcome::Checkmate {
                winner: Color::White,
            } => "1-0",
            Outcome::Checkmate {
                winner: Color::Black,
            } => "0-1",
            _ => "1/2-1/2",
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "checkmate, {} wins", side_name(*winner)),
            Outcome::Stalemate => write!(f, "stalemate"),
            Outcome::FiftyMoveRule => write!(f, "draw by fifty-move rule"),
            Outcome::Repetition => write!(f, "draw by threefold repetition"),
            Outcome::InsufficientMaterial => write!(f, "draw by insufficient material"),
        }
    }
}

pub fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[derive(Debug, Clone)]
pub struct GameBoard {
    /// Start position; None for the standard initial position
    start_fen: Option<String>,
    board: Board,
    /// Applied moves, standard UCI notation
    moves: Vec<Move>,
    /// Occurrences of each position hash (for repetition)
    seen: HashMap<u64, u8>,
}

impl GameBoard {
    pub fn new() -> Self {
        Self::with_board(Board::default(), None)
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let board: Board = fen
            .parse()
            .map_err(|e| BridgeError::collaborator("rules", format!("bad FEN {fen:?}: {e:?}")))?;
        Ok(Self::with_board(board, Some(fen.to_string())))
    }

    fn with_board(board: Board, start_fen: Option<String>) -> Self {
        let mut seen = HashMap::new();
        seen.insert(board.hash(), 1);
        Self {
            start_fen,
            board,
            moves: Vec::new(),
            seen,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn fullmove_number(&self) -> u16 {
        self.board.fullmove_number()
    }

    /// Plies applied since the start position.
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn hash(&self) -> u64 {
        self.board.hash()
    }

    pub(crate) fn position(&self) -> &Board {
        &self.board
    }

    pub fn piece_on(&self, square: Square) -> Option<(Color, Piece)> {
        Some((self.board.color_on(square)?, self.board.piece_on(square)?))
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        moves.into_iter().map(|mv| self.to_standard(mv)).collect()
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.board.is_legal(self.to_internal(mv))
    }

    /// Validate and play one move. The board is left untouched on error.
    pub fn apply(&mut self, mv: Move) -> Result<()> {
        let internal = self.to_internal(mv);
        if !self.board.is_legal(internal) {
            return Err(BridgeError::collaborator(
                "rules",
                format!(
                    "illegal move {mv} for {} in {}",
                    side_name(self.side_to_move()),
                    self.fen()
                ),
            ));
        }
        self.board.play_unchecked(internal);
        self.moves.push(mv);
        *self.seen.entry(self.board.hash()).or_insert(0) += 1;
        Ok(())
    }

    /// None while the game is still running.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.board.status() {
            GameStatus::Won => {
                return Some(Outcome::Checkmate {
                    winner: !self.side_to_move(),
                })
            }
            GameStatus::Drawn => {
                return Some(if self.has_legal_moves() {
                    Outcome::FiftyMoveRule
                } else {
                    Outcome::Stalemate
                })
            }
            GameStatus::Ongoing => {}
        }
        if self.seen.get(&self.board.hash()).copied().unwrap_or(0) >= 3 {
            return Some(Outcome::Repetition);
        }
        if self.insufficient_material() {
            return Some(Outcome::InsufficientMaterial);
        }
        None
    }

    /// PGN result token; `*` while the game runs.
    pub fn result_tag(&self) -> &'static str {
        self.outcome().map_or("*", |o| o.result_tag())
    }

    fn has_legal_moves(&self) -> bool {
        self.board.generate_moves(|piece_moves| !piece_moves.is_empty())
    }

    /// Bare kings, kings plus a single minor piece, or only bishops that all
    /// stand on squares of one colour.
    fn insufficient_material(&self) -> bool {
        let heavy = self.board.pieces(Piece::Pawn)
            | self.board.pieces(Piece::Rook)
            | self.board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let knights = self.board.pieces(Piece::Knight);
        let bishops = self.board.pieces(Piece::Bishop);
        if (knights | bishops).len() <= 1 {
            return true;
        }
        knights.is_empty()
            && (bishops.is_subset(BitBoard::LIGHT_SQUARES)
                || bishops.is_subset(BitBoard::DARK_SQUARES))
    }

    /// Standard king-two-squares castling to cozy-chess's king-takes-rook.
    fn to_internal(&self, mv: Move) -> Move {
        if self.board.piece_on(mv.from) == Some(Piece::King) && file_distance(mv.from, mv.to) == 2 {
            let rook_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
                File::H
            } else {
                File::A
            };
            return Move {
                from: mv.from,
                to: Square::new(rook_file, mv.from.rank()),
                promotion: None,
            };
        }
        mv
    }

    fn to_standard(&self, mv: Move) -> Move {
        let king = self.board.piece_on(mv.from) == Some(Piece::King);
        if king && self.board.color_on(mv.to) == self.board.color_on(mv.from) {
            let king_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
                File::G
            } else {
                File::C
            };
            return Move {
                from: mv.from,
                to: Square::new(king_file, mv.from.rank()),
                promotion: None,
            };
        }
        mv
    }

    /// Standard Algebraic Notation for `mv` in the current position.
    pub fn san(&self, mv: Move) -> Result<String> {
        if !self.is_legal(mv) {
            return Err(BridgeError::collaborator(
                "rules",
                format!("cannot write SAN for illegal move {mv}"),
            ));
        }
        let piece = self.board.piece_on(mv.from).unwrap_or(Piece::Pawn);

        let mut san = if piece == Piece::King && file_distance(mv.from, mv.to) == 2 {
            if (mv.to.file() as u8) > (mv.from.file() as u8) {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            }
        } else {
            let capture = self.board.color_on(mv.to) == Some(!self.side_to_move())
                || (piece == Piece::Pawn && mv.from.file() != mv.to.file());
            let mut san = String::new();
            if piece == Piece::Pawn {
                if capture {
                    san.push(file_char(mv.from));
                }
            } else {
                san.push(piece_letter(piece));
                san.push_str(&self.disambiguation(mv, piece));
            }
            if capture {
                san.push('x');
            }
            san.push_str(&mv.to.to_string());
            if let Some(promo) = mv.promotion {
                san.push('=');
                san.push(piece_letter(promo));
            }
            san
        };

        let mut after = self.board.clone();
        after.play_unchecked(self.to_internal(mv));
        match after.status() {
            GameStatus::Won => san.push('#'),
            _ if !after.checkers().is_empty() => san.push('+'),
            _ => {}
        }
        Ok(san)
    }

    fn disambiguation(&self, mv: Move, piece: Piece) -> String {
        let rivals: Vec<Square> = self
            .legal_moves()
            .into_iter()
            .filter(|other| {
                other.to == mv.to
                    && other.from != mv.from
                    && self.board.piece_on(other.from) == Some(piece)
            })
            .map(|other| other.from)
            .collect();
        if rivals.is_empty() {
            String::new()
        } else if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
            file_char(mv.from).to_string()
        } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
            rank_char(mv.from).to_string()
        } else {
            mv.from.to_string()
        }
    }
}

impl Default for GameBoard {
    fn default() -> Self {
        Self::new()
    }
}

fn file_distance(a: Square, b: Square) -> u8 {
    (a.file() as u8).abs_diff(b.file() as u8)
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

/// Promotion rank for pawns of `side`.
pub fn last_rank(side: Color) -> Rank {
    match side {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;

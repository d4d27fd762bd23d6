//! PGN export of a finished game.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use bridge_core::{Color, GameBoard, Result};

/// Width at which movetext lines are wrapped
const LINE_WIDTH: usize = 80;

/// The seven-tag roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameHeaders {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl GameHeaders {
    /// Headers for UltraChess playing `msx_side` against `engine`, dated
    /// today on this host.
    pub fn for_match(engine: &str, msx_side: Color) -> Self {
        let (white, black) = match msx_side {
            Color::White => ("UltraChess".to_string(), engine.to_string()),
            Color::Black => (engine.to_string(), "UltraChess".to_string()),
        };
        Self {
            event: format!(
                "UltraChess on OpenMSX versus {engine} on {}",
                std::env::consts::ARCH
            ),
            site: host_name(),
            date: chrono::Local::now().format("%Y.%m.%d").to_string(),
            round: "?".to_string(),
            white,
            black,
        }
    }
}

/// A game ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub headers: GameHeaders,
    /// Set when the game did not start from the initial position
    pub start_fen: Option<String>,
    /// Movetext tokens: move numbers and SAN moves
    pub movetext: Vec<String>,
    pub result: String,
}

impl GameRecord {
    /// Replay the board's moves from its start position to produce SAN.
    pub fn from_board(board: &GameBoard, headers: GameHeaders) -> Result<Self> {
        let mut replay = match board.start_fen() {
            Some(fen) => GameBoard::from_fen(fen)?,
            None => GameBoard::new(),
        };

        let mut movetext = Vec::with_capacity(board.ply_count() * 3 / 2);
        for (ply, &mv) in board.moves().iter().enumerate() {
            match replay.side_to_move() {
                Color::White => movetext.push(format!("{}.", replay.fullmove_number())),
                Color::Black if ply == 0 => movetext.push(format!("{}...", replay.fullmove_number())),
                Color::Black => {}
            }
            movetext.push(replay.san(mv)?);
            replay.apply(mv)?;
        }

        Ok(Self {
            headers,
            start_fen: board.start_fen().map(str::to_string),
            movetext,
            result: board.result_tag().to_string(),
        })
    }

    pub fn to_pgn(&self) -> String {
        let h = &self.headers;
        let mut tags = vec![
            ("Event", h.event.as_str()),
            ("Site", h.site.as_str()),
            ("Date", h.date.as_str()),
            ("Round", h.round.as_str()),
            ("White", h.white.as_str()),
            ("Black", h.black.as_str()),
            ("Result", self.result.as_str()),
        ];
        if let Some(fen) = &self.start_fen {
            tags.push(("SetUp", "1"));
            tags.push(("FEN", fen.as_str()));
        }

        let mut out = String::new();
        for (name, value) in tags {
            out.push_str(&format!("[{name} \"{}\"]\n", escape_tag(value)));
        }
        out.push('\n');

        let mut line = String::new();
        for token in self.movetext.iter().chain(std::iter::once(&self.result)) {
            if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
                out.push_str(&line);
                out.push('\n');
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(token);
        }
        out.push_str(&line);
        out
    }

    /// Append the game and a blank line to `path`.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        write!(file, "{}\n\n", self.to_pgn())?;
        Ok(())
    }
}

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// This machine's name for the Site tag, `?` if unknown.
pub fn host_name() -> String {
    let name = gethostname::gethostname();
    let name = name.to_string_lossy();
    let name = name.trim();
    if name.is_empty() {
        "?".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;

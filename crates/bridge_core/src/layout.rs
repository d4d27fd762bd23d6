//! Fixed screen layout of UltraChess.
//!
//! Every offset the interpreter looks at lives here as a table of
//! (row, column range, pattern) rules, so the layout can be checked against a
//! captured screen on its own. Rows and columns are 0-based.

use cozy_chess::Color;

use crate::screen::{ScreenGrid, COLS};

/// A horizontal run of cells on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row: usize,
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub const fn new(row: usize, start: usize, end: usize) -> Self {
        Self { row, start, end }
    }

    pub const fn line(row: usize) -> Self {
        Self::new(row, 0, COLS)
    }

    pub const fn cell(row: usize, col: usize) -> Self {
        Self::new(row, col, col + 1)
    }

    pub fn read(&self, grid: &ScreenGrid) -> String {
        grid.text(self.row, self.start, self.end)
    }
}

/// What a window must show for a rule to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Window contains the text anywhere
    Contains(&'static str),
    /// Window text equals the text exactly
    Equals(&'static str),
    /// Window holds something other than blanks
    NotBlank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub window: Window,
    pub pattern: Pattern,
}

impl Rule {
    pub const fn new(window: Window, pattern: Pattern) -> Self {
        Self { window, pattern }
    }

    pub fn matches(&self, grid: &ScreenGrid) -> bool {
        let text = self.window.read(grid);
        match self.pattern {
            Pattern::Contains(needle) => text.contains(needle),
            Pattern::Equals(expected) => text == expected,
            Pattern::NotBlank => text.bytes().any(|b| b != b' ' && b != 0),
        }
    }
}

/// Semantic events recognised on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// "Play Analyse or Load" main menu
    ModeSelect,
    /// "Your colour (B,W):"
    ColorSelect,
    /// "Time Limit (Seconds)"
    TimeLimit,
    /// Column headers of the game screen
    PlayBanner,
    /// CHECK shown in the move list
    Check,
    /// MATE shown in the move list
    Announcement,
    /// MATE shown on the status line
    Mate,
}

/// Width of the move-list area on the left of the game screen.
const MOVE_LIST: usize = 14;

/// Cue table. A cue is visible when any of its rules matches.
pub const CUES: &[(Cue, Rule)] = &[
    (Cue::ModeSelect, Rule::new(Window::line(3), Pattern::Contains("Play Analyse or Load"))),
    (Cue::ColorSelect, Rule::new(Window::line(4), Pattern::Contains("Your colour (B,W):"))),
    (Cue::TimeLimit, Rule::new(Window::line(5), Pattern::Contains("Time Limit (Seconds)"))),
    (Cue::PlayBanner, Rule::new(Window::line(5), Pattern::Contains("PLAYER  MSX"))),
    (Cue::PlayBanner, Rule::new(Window::line(5), Pattern::Contains("MSX   PLAYER"))),
    (Cue::Check, Rule::new(Window::new(15, 0, MOVE_LIST), Pattern::Contains("CHECK"))),
    (Cue::Announcement, Rule::new(Window::new(15, 0, MOVE_LIST), Pattern::Contains("MATE"))),
    (Cue::Mate, Rule::new(Window::new(16, 0, MOVE_LIST), Pattern::Contains("MATE"))),
];

/// Current move number, right-aligned in the first two columns.
pub const MOVE_NUMBER: Window = Window::new(15, 0, 2);

/// Character the program uses as its input cursor.
pub const CURSOR: &str = "#";

/// Labels that can overwrite a notation window one ply late.
pub const TRANSIENT_LABELS: &[&str] = &["check", "mate"];

/// Where one side's moves appear in the move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideLayout {
    /// Text of the side's latest move
    pub notation: Window,
    /// Previous row's copy, read when `notation` shows a transient label
    pub fallback: Window,
    /// Last character of a typed square-to-square move
    pub end_of_move: Rule,
    pub short_castle: Rule,
    pub long_castle: Rule,
    /// Shows `#` while the program waits for this side's input
    pub cursor: Window,
    /// Shows `O` while a castle is being echoed over the cursor
    pub cursor_probe: Rule,
}

pub const WHITE: SideLayout = SideLayout {
    notation: Window::new(15, 3, 8),
    fallback: Window::new(14, 3, 8),
    end_of_move: Rule::new(Window::cell(15, 7), Pattern::NotBlank),
    short_castle: Rule::new(Window::new(15, 4, 7), Pattern::Equals("O-O")),
    long_castle: Rule::new(Window::new(15, 3, 8), Pattern::Equals("O-O-O")),
    cursor: Window::cell(15, 3),
    cursor_probe: Rule::new(Window::cell(15, 4), Pattern::Equals("O")),
};

pub const BLACK: SideLayout = SideLayout {
    notation: Window::new(14, 9, 14),
    fallback: Window::new(13, 9, 14),
    end_of_move: Rule::new(Window::cell(14, 13), Pattern::NotBlank),
    short_castle: Rule::new(Window::new(14, 10, 13), Pattern::Equals("O-O")),
    long_castle: Rule::new(Window::new(14, 9, 14), Pattern::Equals("O-O-O")),
    cursor: Window::cell(15, 9),
    cursor_probe: Rule::new(Window::cell(15, 10), Pattern::Equals("O")),
};

pub fn side_layout(side: Color) -> &'static SideLayout {
    match side {
        Color::White => &WHITE,
        Color::Black => &BLACK,
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod layout_tests;

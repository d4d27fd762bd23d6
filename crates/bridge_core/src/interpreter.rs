//! Screen Interpreter: turns a raw [`ScreenGrid`] into a [`ScreenState`].

use cozy_chess::Color;

use crate::layout::{side_layout, Cue, SideLayout, CURSOR, CUES, MOVE_NUMBER, TRANSIENT_LABELS};
use crate::screen::ScreenGrid;

/// The dominant prompt on screen, most advanced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    None,
    ModeSelect,
    ColorSelect,
    TimeLimit,
    /// Game screen, moves being entered
    MoveInProgress,
    Check,
    Mate,
}

/// What the move list says about one side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideView {
    /// Move text finished and the opponent's cursor is up
    pub completed: bool,
    /// Latest move text, lowercased, with the label quirk resolved
    pub notation: String,
    /// The side's cursor `#` is showing
    pub awaiting_input: bool,
    /// Typing for this side has visibly begun
    pub input_started: bool,
}

/// Semantic view of one capture. Recomputed for every grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    pub cues: Vec<Cue>,
    pub move_number: Option<u32>,
    pub white: SideView,
    pub black: SideView,
}

impl ScreenState {
    pub fn shows(&self, cue: Cue) -> bool {
        self.cues.contains(&cue)
    }

    pub fn prompt(&self) -> Prompt {
        if self.shows(Cue::Mate) {
            Prompt::Mate
        } else if self.shows(Cue::Check) {
            Prompt::Check
        } else if self.shows(Cue::PlayBanner) {
            Prompt::MoveInProgress
        } else if self.shows(Cue::TimeLimit) {
            Prompt::TimeLimit
        } else if self.shows(Cue::ColorSelect) {
            Prompt::ColorSelect
        } else if self.shows(Cue::ModeSelect) {
            Prompt::ModeSelect
        } else {
            Prompt::None
        }
    }

    pub fn in_game(&self) -> bool {
        self.shows(Cue::PlayBanner)
    }

    pub fn side(&self, side: Color) -> &SideView {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// `side` has finished its move. A checkmate announcement counts even
    /// without the completion markers, since it freezes the move list.
    pub fn move_finished(&self, side: Color) -> bool {
        self.shows(Cue::Mate) || (self.in_game() && self.side(side).completed)
    }

    pub fn notation(&self, side: Color) -> &str {
        &self.side(side).notation
    }

    /// The program echoed the first keystrokes typed for `side`.
    pub fn input_started(&self, side: Color) -> bool {
        self.in_game() && self.side(side).input_started
    }

    /// The program accepted a full move typed for `side`.
    pub fn input_settled(&self, side: Color) -> bool {
        self.shows(Cue::Mate)
            || self.shows(Cue::Check)
            || self.shows(Cue::Announcement)
            || (self.in_game() && self.side(side).awaiting_input)
    }
}

/// Interpret one capture.
pub fn interpret(grid: &ScreenGrid) -> ScreenState {
    let mut cues = Vec::new();
    for (cue, rule) in CUES {
        if !cues.contains(cue) && rule.matches(grid) {
            cues.push(*cue);
        }
    }

    let white_cursor = cursor_up(grid, side_layout(Color::White));
    let black_cursor = cursor_up(grid, side_layout(Color::Black));

    ScreenState {
        cues,
        move_number: MOVE_NUMBER.read(grid).trim().parse().ok(),
        white: side_view(grid, side_layout(Color::White), black_cursor),
        black: side_view(grid, side_layout(Color::Black), white_cursor),
    }
}

fn cursor_up(grid: &ScreenGrid, layout: &SideLayout) -> bool {
    layout.cursor.read(grid) == CURSOR
}

fn side_view(grid: &ScreenGrid, layout: &SideLayout, opponent_cursor: bool) -> SideView {
    let typed = layout.end_of_move.matches(grid)
        || layout.short_castle.matches(grid)
        || layout.long_castle.matches(grid);
    let awaiting_input = cursor_up(grid, layout);

    SideView {
        completed: typed && opponent_cursor,
        notation: notation(grid, layout),
        awaiting_input,
        input_started: !awaiting_input || layout.cursor_probe.matches(grid),
    }
}

/// The notation row is sometimes overwritten by a CHECK/MATE label one ply
/// late; the move is then still readable on the row above.
fn notation(grid: &ScreenGrid, layout: &SideLayout) -> String {
    let primary = layout.notation.read(grid).to_ascii_lowercase();
    if TRANSIENT_LABELS.contains(&primary.trim()) {
        layout.fallback.read(grid).to_ascii_lowercase()
    } else {
        primary
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod interpreter_tests;

//! Turn Synchronizer: decides whose turn it is and drives one ply at a time.
//!
//! Every observation comes from polling the screen, and every blocking wait
//! (a prompt, the opponent's move, an engine search, the echo of typed keys)
//! runs under a [`Deadline`] armed from a [`Watchdog`]. An expired deadline
//! is fatal: there is no way to tell how far a half-typed move got.

use std::time::Duration;

use bridge_core::{
    interpret, side_name, to_board_move, to_screen_keystrokes, BridgeError, Color, Deadline,
    GameBoard, Move, Piece, Prompt, Result, ScreenSource, ScreenState, Watchdog,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::book::OpeningBook;
use crate::engine::MoveProvider;
use crate::keyboard::KeyboardDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    AwaitingBootstrap,
    AwaitingOpponentMove,
    SubmittingOwnMove,
    GameOver,
}

/// Budgets and poll intervals for every wait.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Engine `movetime`
    pub search_time: Duration,
    /// Guards moves and searches
    pub watchdog: Watchdog,
    /// Guards the start-up prompts
    pub boot: Watchdog,
    /// Polling for the opponent's move
    pub screen_poll: Duration,
    /// Polling for the echo of typed keys
    pub input_poll: Duration,
    /// Polling for the start-up prompts
    pub prompt_poll: Duration,
    /// Answer to UltraChess's time-limit prompt
    pub msx_time_limit_secs: u64,
}

pub struct TurnSynchronizer {
    screen: Box<dyn ScreenSource>,
    keyboard: KeyboardDriver,
    engine: Box<dyn MoveProvider>,
    book: Option<OpeningBook>,
    rng: Box<dyn RngCore>,
    timing: Timing,
    /// Side played by UltraChess; the engine has the other one
    msx_side: Color,
    state: SyncState,
    shut_down: bool,
}

impl TurnSynchronizer {
    pub fn new(
        screen: Box<dyn ScreenSource>,
        keyboard: KeyboardDriver,
        engine: Box<dyn MoveProvider>,
        timing: Timing,
        msx_side: Color,
    ) -> Self {
        Self {
            screen,
            keyboard,
            engine,
            book: None,
            rng: Box::new(StdRng::from_entropy()),
            timing,
            msx_side,
            state: SyncState::AwaitingBootstrap,
            shut_down: false,
        }
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = Some(book);
        self
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn msx_side(&self) -> Color {
        self.msx_side
    }

    pub fn engine_side(&self) -> Color {
        !self.msx_side
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Answer the three start-up prompts, wait for the game screen and
    /// reset the engine.
    pub fn bootstrap(&mut self, board: &GameBoard) -> Result<()> {
        if self.state != SyncState::AwaitingBootstrap {
            return Ok(());
        }

        let colour = match self.engine_side() {
            Color::White => "W",
            Color::Black => "B",
        };
        let time_limit = format!("{}\r", self.timing.msx_time_limit_secs);
        let answers = [
            (Prompt::ModeSelect, "P", "mode prompt"),
            (Prompt::ColorSelect, colour, "colour prompt"),
            (Prompt::TimeLimit, time_limit.as_str(), "time-limit prompt"),
        ];

        for (prompt, keys, what) in answers {
            let deadline = self.timing.boot.arm(what);
            self.wait_for(&deadline, self.timing.prompt_poll, |s| s.prompt() == prompt)?;
            debug!(?prompt, keys = keys.trim_end(), "answering prompt");
            self.keyboard.type_text(keys, &deadline)?;
        }

        let deadline = self.timing.boot.arm("game screen");
        self.wait_for(&deadline, self.timing.prompt_poll, ScreenState::in_game)?;

        let deadline = self.timing.watchdog.arm("engine new game");
        self.engine.new_game(&deadline)?;

        self.state = self.next_state(board);
        info!(
            msx = side_name(self.msx_side),
            engine = %self.engine.name(),
            "game started"
        );
        Ok(())
    }

    /// Play exactly one ply: whoever is to move on `board` moves, and the
    /// move is applied to `board`.
    pub fn play_ply(&mut self, board: &mut GameBoard) -> Result<Move> {
        if self.state == SyncState::AwaitingBootstrap {
            return Err(BridgeError::collaborator(
                "emulator",
                "game screen not reached; bootstrap first",
            ));
        }

        self.state = self.next_state(board);
        let mv = match self.state {
            SyncState::AwaitingOpponentMove => self.await_opponent_move(board)?,
            SyncState::SubmittingOwnMove => self.submit_own_move(board)?,
            SyncState::AwaitingBootstrap | SyncState::GameOver => {
                return Err(BridgeError::collaborator("rules", "the game is already over"));
            }
        };
        self.state = self.next_state(board);
        Ok(mv)
    }

    /// State implied by the board.
    pub fn next_state(&self, board: &GameBoard) -> SyncState {
        if board.outcome().is_some() {
            SyncState::GameOver
        } else if board.side_to_move() == self.msx_side {
            SyncState::AwaitingOpponentMove
        } else {
            SyncState::SubmittingOwnMove
        }
    }

    fn await_opponent_move(&mut self, board: &mut GameBoard) -> Result<Move> {
        let side = self.msx_side;
        let deadline = self.timing.watchdog.arm("UltraChess move");
        let screen = self.wait_for(&deadline, self.timing.screen_poll, |s| {
            s.move_finished(side)
        })?;
        drop(deadline);

        let notation = screen.notation(side).trim();
        let mv = to_board_move(notation, board, side)?;
        board.apply(mv)?;
        debug!(notation, %mv, "UltraChess moved");
        Ok(mv)
    }

    fn submit_own_move(&mut self, board: &mut GameBoard) -> Result<Move> {
        let side = self.engine_side();
        let mv = as_queen_promotion(self.choose_move(board)?);
        if !board.is_legal(mv) {
            return Err(BridgeError::collaborator(
                "engine",
                format!("move {mv} is illegal in {}", board.fen()),
            ));
        }

        let keys = to_screen_keystrokes(mv);
        let deadline = self.timing.watchdog.arm("move entry");
        self.keyboard.type_text(&keys.origin_text(), &deadline)?;
        self.wait_for(&deadline, self.timing.input_poll, |s| s.input_started(side))?;

        let deadline = self.timing.watchdog.arm("move confirmation");
        self.keyboard
            .type_text(&format!("-{}\r", keys.destination_text()), &deadline)?;
        self.wait_for(&deadline, self.timing.input_poll, |s| s.input_settled(side))?;
        drop(deadline);

        board.apply(mv)?;
        debug!(%keys, %mv, "engine move entered");
        Ok(mv)
    }

    /// Book move if the position is in the book, otherwise an engine search.
    fn choose_move(&mut self, board: &GameBoard) -> Result<Move> {
        if let Some(book) = &self.book {
            if let Some(mv) = book.pick(board, self.rng.as_mut()) {
                debug!(%mv, "book move");
                return Ok(mv);
            }
        }
        let deadline = self.timing.watchdog.arm("engine search");
        self.engine
            .best_move(board, self.timing.search_time, &deadline)
    }

    /// Poll the screen every `interval` until `done` holds.
    fn wait_for(
        &mut self,
        deadline: &Deadline,
        interval: Duration,
        done: impl Fn(&ScreenState) -> bool,
    ) -> Result<ScreenState> {
        loop {
            let grid = self.screen.capture(deadline)?;
            let state = interpret(&grid);
            if done(&state) {
                return Ok(state);
            }
            trace!(what = deadline.what(), "waiting\n{grid}");
            deadline.sleep(interval)?;
        }
    }

    /// Stop the engine and the emulator. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.engine.shutdown();
        self.keyboard.shutdown();
    }
}

/// The on-screen input can only promote to a queen.
fn as_queen_promotion(mv: Move) -> Move {
    match mv.promotion {
        Some(piece) if piece != Piece::Queen => {
            warn!(%mv, "underpromotion submitted as a queen promotion");
            Move {
                promotion: Some(Piece::Queen),
                ..mv
            }
        }
        _ => mv,
    }
}

#[cfg(test)]
#[path = "synchronizer_tests.rs"]
mod synchronizer_tests;

//! Scripted stand-ins for the emulator and the engine, shared by the unit
//! tests of the synchronizer and the match driver.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use bridge_core::{Deadline, GameBoard, Move, Result, ScreenGrid, ScreenSource};

use crate::engine::MoveProvider;
use crate::keyboard::ControlLink;

const STALL_SLICE: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Frame(String),
    Reply(String),
}

/// Every command frame follows the `ok` reply to the one before it.
pub fn assert_one_command_at_a_time(events: &[LinkEvent]) {
    let mut acknowledged = true;
    for event in events {
        match event {
            LinkEvent::Frame(frame) => {
                assert!(acknowledged, "{frame:?} written before previous ack");
                acknowledged = false;
            }
            LinkEvent::Reply(reply) => {
                if reply.contains(r#"result="ok""#) {
                    acknowledged = true;
                }
            }
        }
    }
    assert!(acknowledged, "last command never acknowledged");
}

#[derive(Default)]
struct MsxState {
    screen: ScreenGrid,
    /// Screen shown after each successive keyboard command
    after_keys: VecDeque<ScreenGrid>,
    replies: VecDeque<String>,
    events: Vec<LinkEvent>,
    typed: Vec<String>,
    /// Never answer commands
    mute: bool,
    shut_down: bool,
}

/// A fake UltraChess: a screen that changes as keys are typed.
#[derive(Clone, Default)]
pub struct FakeMsx(Rc<RefCell<MsxState>>);

impl FakeMsx {
    pub fn new(screen: ScreenGrid) -> Self {
        let msx = Self::default();
        msx.0.borrow_mut().screen = screen;
        msx
    }

    /// Queue the screen shown after the next not-yet-scripted keystroke.
    pub fn then(self, screen: ScreenGrid) -> Self {
        self.0.borrow_mut().after_keys.push_back(screen);
        self
    }

    pub fn mute(self) -> Self {
        self.0.borrow_mut().mute = true;
        self
    }

    pub fn screen_source(&self) -> Box<dyn ScreenSource> {
        Box::new(FakeScreen(self.clone()))
    }

    pub fn link(&self) -> Box<dyn ControlLink> {
        Box::new(FakeLink(self.clone()))
    }

    pub fn typed(&self) -> Vec<String> {
        self.0.borrow().typed.clone()
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.0.borrow().events.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.0.borrow().shut_down
    }

    fn state(&self) -> std::cell::RefMut<'_, MsxState> {
        self.0.borrow_mut()
    }
}

struct FakeScreen(FakeMsx);

impl ScreenSource for FakeScreen {
    fn capture(&mut self, deadline: &Deadline) -> Result<ScreenGrid> {
        deadline.check()?;
        Ok(self.0.state().screen.clone())
    }
}

struct FakeLink(FakeMsx);

impl ControlLink for FakeLink {
    fn write_frame(&mut self, frame: &str) -> Result<()> {
        let mut state = self.0.state();
        state.events.push(LinkEvent::Frame(frame.to_string()));
        if let Some(text) = typed_text(frame) {
            state.typed.push(text);
        }
        if let Some(next) = state.after_keys.pop_front() {
            state.screen = next;
        }
        if !state.mute {
            state.replies.push_back("<openmsx-output>".to_string());
            state
                .replies
                .push_back(r#"<reply result="ok"></reply>"#.to_string());
        }
        Ok(())
    }

    fn read_line(&mut self, deadline: &Deadline) -> Result<String> {
        loop {
            let next = self.0.state().replies.pop_front();
            if let Some(reply) = next {
                self.0.state().events.push(LinkEvent::Reply(reply.clone()));
                return Ok(reply);
            }
            deadline.sleep(STALL_SLICE)?;
        }
    }

    fn shutdown(&mut self) {
        self.0.state().shut_down = true;
    }
}

/// Text inside `type_via_keyboard … "<text>"`.
fn typed_text(frame: &str) -> Option<String> {
    let start = frame.find('"')? + 1;
    let end = frame.rfind('"')?;
    (end > start).then(|| frame[start..end].to_string())
}

/// Observes a [`FakeEngine`] after it has been boxed.
#[derive(Clone, Default)]
pub struct EngineProbe {
    pub searches: Rc<Cell<usize>>,
    pub shut_down: Rc<Cell<bool>>,
}

/// Engine that plays a fixed list of moves, then stalls.
pub struct FakeEngine {
    moves: VecDeque<Move>,
    probe: EngineProbe,
}

impl FakeEngine {
    pub fn new(moves: &[&str]) -> (Self, EngineProbe) {
        let probe = EngineProbe::default();
        let engine = Self {
            moves: moves.iter().map(|m| m.parse().unwrap()).collect(),
            probe: probe.clone(),
        };
        (engine, probe)
    }
}

impl MoveProvider for FakeEngine {
    fn name(&self) -> &str {
        "FakeEngine"
    }

    fn best_move(
        &mut self,
        _board: &GameBoard,
        _move_time: Duration,
        deadline: &Deadline,
    ) -> Result<Move> {
        self.probe.searches.set(self.probe.searches.get() + 1);
        match self.moves.pop_front() {
            Some(mv) => Ok(mv),
            None => loop {
                deadline.sleep(STALL_SLICE)?;
            },
        }
    }

    fn shutdown(&mut self) {
        self.probe.shut_down.set(true);
    }
}

/// The game screen with `rows` written from column 0.
pub fn game_screen(rows: &[(usize, &str)]) -> ScreenGrid {
    rows.iter().fold(
        ScreenGrid::blank().with_text(5, 2, "PLAYER  MSX"),
        |grid, (row, text)| grid.with_text(*row, 0, text),
    )
}

pub fn menu_screen() -> ScreenGrid {
    ScreenGrid::blank().with_text(3, 4, "Play Analyse or Load")
}

pub fn colour_screen() -> ScreenGrid {
    menu_screen().with_text(4, 4, "Your colour (B,W):")
}

pub fn time_screen() -> ScreenGrid {
    colour_screen().with_text(5, 4, "Time Limit (Seconds)")
}

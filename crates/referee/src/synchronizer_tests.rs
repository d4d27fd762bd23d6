use super::*;
use crate::testing::{
    assert_one_command_at_a_time, colour_screen, game_screen, menu_screen, time_screen, EngineProbe,
    FakeEngine, FakeMsx,
};
use bridge_core::ScreenGrid;
use rand::rngs::mock::StepRng;
use std::path::Path;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn timing() -> Timing {
    Timing {
        search_time: ms(10),
        watchdog: Watchdog::new(ms(150)),
        boot: Watchdog::new(ms(150)),
        screen_poll: ms(1),
        input_poll: ms(1),
        prompt_poll: ms(1),
        msx_time_limit_secs: 1,
    }
}

fn mv(text: &str) -> Move {
    text.parse().unwrap()
}

/// Start-up screens followed by `game`.
fn booting_msx(game: ScreenGrid) -> FakeMsx {
    FakeMsx::new(menu_screen())
        .then(colour_screen())
        .then(time_screen())
        .then(game)
}

fn synchronizer(msx: &FakeMsx, engine_moves: &[&str], msx_side: Color) -> (TurnSynchronizer, EngineProbe) {
    let (engine, probe) = FakeEngine::new(engine_moves);
    let sync = TurnSynchronizer::new(
        msx.screen_source(),
        KeyboardDriver::new(msx.link()),
        Box::new(engine),
        timing(),
        msx_side,
    );
    (sync, probe)
}

#[test]
fn test_bootstrap_answers_prompts_in_order() {
    let msx = booting_msx(game_screen(&[(15, " 1 #")]));
    let (mut sync, _) = synchronizer(&msx, &[], Color::Black);
    let board = GameBoard::new();

    assert_eq!(sync.state(), SyncState::AwaitingBootstrap);
    sync.bootstrap(&board).unwrap();

    // The engine plays White, so White is the colour typed.
    assert_eq!(msx.typed(), vec!["P", "W", "1\r"]);
    assert_eq!(sync.state(), SyncState::SubmittingOwnMove);
}

#[test]
fn test_bootstrap_stalls_without_prompt() {
    let msx = FakeMsx::new(ScreenGrid::blank());
    let (mut sync, _) = synchronizer(&msx, &[], Color::White);

    let err = sync.bootstrap(&GameBoard::new()).unwrap_err();
    assert!(matches!(err, BridgeError::StallTimeout { what: "mode prompt", .. }));
    assert!(msx.typed().is_empty());
}

#[test]
fn test_play_before_bootstrap_is_refused() {
    let msx = FakeMsx::new(ScreenGrid::blank());
    let (mut sync, _) = synchronizer(&msx, &["e2e4"], Color::Black);
    let mut board = GameBoard::new();
    assert!(sync.play_ply(&mut board).is_err());
    assert_eq!(board.ply_count(), 0);
}

#[test]
fn test_engine_as_white_to_checkmate() {
    let after_first = [(14, " 1 f2-f3 e7-e5"), (15, " 2 #")];
    let msx = booting_msx(game_screen(&[(15, " 1 #")]))
        .then(game_screen(&[(15, " 1 f2")]))
        .then(game_screen(&after_first))
        .then(game_screen(&[(14, " 1 f2-f3 e7-e5"), (15, " 2 g2")]))
        .then(game_screen(&[
            (13, " 1 f2-f3 e7-e5"),
            (14, " 2 g2-g4 d8-h4"),
            (15, " 3"),
            (16, "  MATE"),
        ]));
    let (mut sync, probe) = synchronizer(&msx, &["f2f3", "g2g4"], Color::Black);
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();

    let mut played = Vec::new();
    while sync.state() != SyncState::GameOver {
        played.push(sync.play_ply(&mut board).unwrap());
        assert_eq!(board.ply_count(), played.len());
    }

    assert_eq!(played, vec![mv("f2f3"), mv("e7e5"), mv("g2g4"), mv("d8h4")]);
    assert_eq!(board.result_tag(), "0-1");
    assert_eq!(probe.searches.get(), 2);
    assert_eq!(
        msx.typed(),
        vec!["P", "W", "1\r", "f2", "-f3\r", "g2", "-g4\r"]
    );
    let events = msx.events();
    // one frame and two reply lines per command
    assert_eq!(events.len(), 3 * msx.typed().len());
    assert_one_command_at_a_time(&events);
}

#[test]
fn test_msx_as_white_then_engine_stalls() {
    let msx = booting_msx(game_screen(&[(15, " 1 e2-e4 #")]))
        .then(game_screen(&[(15, " 1 e2-e4 e7")]))
        .then(game_screen(&[(14, " 1 e2-e4 e7-e5"), (15, " 2 g1-f3 #")]));
    let (mut sync, probe) = synchronizer(&msx, &["e7e5"], Color::White);
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();
    assert_eq!(msx.typed(), vec!["P", "B", "1\r"]);
    assert_eq!(sync.state(), SyncState::AwaitingOpponentMove);

    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("e2e4"));
    assert_eq!(sync.state(), SyncState::SubmittingOwnMove);
    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("e7e5"));
    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("g1f3"));

    // The engine has nothing left to say.
    let err = sync.play_ply(&mut board).unwrap_err();
    assert!(matches!(err, BridgeError::StallTimeout { what: "engine search", .. }));
    assert_eq!(board.ply_count(), 3);
    assert_eq!(probe.searches.get(), 2);
}

#[test]
fn test_missing_completion_marker_stalls() {
    // UltraChess (White) never finishes its first move.
    let msx = booting_msx(game_screen(&[(15, " 1 #")]));
    let (mut sync, _) = synchronizer(&msx, &[], Color::White);
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();

    let started = std::time::Instant::now();
    let err = sync.play_ply(&mut board).unwrap_err();
    assert!(matches!(err, BridgeError::StallTimeout { what: "UltraChess move", .. }));
    assert!(started.elapsed() >= ms(150));
    assert_eq!(board.ply_count(), 0);
}

#[test]
fn test_book_move_skips_the_engine() {
    let msx = booting_msx(game_screen(&[(15, " 1 #")]))
        .then(game_screen(&[(15, " 1 e2")]))
        .then(game_screen(&[(14, " 1 e2-e4 e7-e5"), (15, " 2 #")]));
    let (sync, probe) = synchronizer(&msx, &[], Color::Black);
    let book = OpeningBook::parse("e2e4\nd2d4\n", Path::new("test.book")).unwrap();
    let mut sync = sync.with_book(book).with_rng(Box::new(StepRng::new(0, 0)));
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();

    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("e2e4"));
    assert_eq!(probe.searches.get(), 0);
    assert_eq!(&msx.typed()[3..], &["e2", "-e4\r"]);
}

#[test]
fn test_underpromotion_is_entered_as_queen() {
    let msx = booting_msx(game_screen(&[(15, " 1 #")]))
        .then(game_screen(&[(15, " 1 a7")]))
        .then(game_screen(&[(15, " 1 a7-a8 CHECK")]));
    let (mut sync, _) = synchronizer(&msx, &["a7a8n"], Color::Black);
    let mut board = GameBoard::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    sync.bootstrap(&board).unwrap();

    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("a7a8q"));
    assert_eq!(&msx.typed()[3..], &["a7", "-a8\r"]);
}

#[test]
fn test_illegal_engine_move_is_never_typed() {
    let msx = booting_msx(game_screen(&[(15, " 1 #")]));
    let (mut sync, _) = synchronizer(&msx, &["e2e5"], Color::Black);
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();

    let err = sync.play_ply(&mut board).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::CollaboratorFailure {
            collaborator: "engine",
            ..
        }
    ));
    assert_eq!(msx.typed().len(), 3);
}

#[test]
fn test_garbled_notation_is_fatal() {
    let msx = booting_msx(game_screen(&[(15, " 1 zz-zz #")]));
    let (mut sync, _) = synchronizer(&msx, &[], Color::White);
    let mut board = GameBoard::new();
    sync.bootstrap(&board).unwrap();

    let err = sync.play_ply(&mut board).unwrap_err();
    assert!(matches!(err, BridgeError::UnparsableNotation { .. }));
    assert_eq!(board.ply_count(), 0);
}

#[test]
fn test_castling_read_from_screen() {
    let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
    let msx = booting_msx(game_screen(&[(15, "10  O-O  #")]));
    let (mut sync, _) = synchronizer(&msx, &[], Color::White);
    let mut board = GameBoard::from_fen(fen).unwrap();
    sync.bootstrap(&board).unwrap();

    assert_eq!(sync.play_ply(&mut board).unwrap(), mv("e1g1"));
}

#[test]
fn test_shutdown_stops_both_sides_once() {
    let msx = FakeMsx::new(ScreenGrid::blank());
    let (mut sync, probe) = synchronizer(&msx, &[], Color::White);
    sync.shutdown();
    sync.shutdown();
    assert!(probe.shut_down.get());
    assert!(msx.is_shut_down());
}

#[test]
fn test_next_state_follows_the_board() {
    let msx = FakeMsx::new(ScreenGrid::blank());
    let (sync, _) = synchronizer(&msx, &[], Color::White);
    let mut board = GameBoard::new();
    assert_eq!(sync.next_state(&board), SyncState::AwaitingOpponentMove);
    board.apply(mv("e2e4")).unwrap();
    assert_eq!(sync.next_state(&board), SyncState::SubmittingOwnMove);

    let mated = GameBoard::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
        .unwrap();
    assert_eq!(sync.next_state(&mated), SyncState::GameOver);
}

use super::*;
use bridge_core::Move;

fn headers() -> GameHeaders {
    GameHeaders {
        event: "UltraChess on OpenMSX versus Stockfish 16 on x86_64".to_string(),
        site: "bench".to_string(),
        date: "2024.03.09".to_string(),
        round: "?".to_string(),
        white: "Stockfish 16".to_string(),
        black: "UltraChess".to_string(),
    }
}

fn play(board: &mut GameBoard, moves: &[&str]) {
    for m in moves {
        board.apply(m.parse::<Move>().unwrap()).unwrap();
    }
}

#[test]
fn test_fools_mate_pgn() {
    let mut board = GameBoard::new();
    play(&mut board, &["f2f3", "e7e5", "g2g4", "d8h4"]);
    let record = GameRecord::from_board(&board, headers()).unwrap();

    assert_eq!(record.movetext, vec!["1.", "f3", "e5", "2.", "g4", "Qh4#"]);
    assert_eq!(
        record.to_pgn(),
        "[Event \"UltraChess on OpenMSX versus Stockfish 16 on x86_64\"]\n\
         [Site \"bench\"]\n\
         [Date \"2024.03.09\"]\n\
         [Round \"?\"]\n\
         [White \"Stockfish 16\"]\n\
         [Black \"UltraChess\"]\n\
         [Result \"0-1\"]\n\
         \n\
         1. f3 e5 2. g4 Qh4# 0-1"
    );
}

#[test]
fn test_unfinished_game_and_castling() {
    let mut board = GameBoard::new();
    play(&mut board, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"]);
    let record = GameRecord::from_board(&board, headers()).unwrap();
    assert_eq!(record.result, "*");
    assert_eq!(record.movetext.last().unwrap(), "O-O");
    assert!(record.to_pgn().ends_with("4. O-O *"));
}

#[test]
fn test_setup_position_black_to_move() {
    let fen = "4k3/8/8/8/8/8/4p3/K7 b - - 0 40";
    let mut board = GameBoard::from_fen(fen).unwrap();
    play(&mut board, &["e2e1q"]);
    let record = GameRecord::from_board(&board, headers()).unwrap();

    assert_eq!(record.movetext, vec!["40...", "e1=Q+"]);
    let pgn = record.to_pgn();
    assert!(pgn.contains("[SetUp \"1\"]\n"));
    assert!(pgn.contains(&format!("[FEN \"{fen}\"]\n")));
}

#[test]
fn test_long_games_wrap() {
    let mut board = GameBoard::new();
    play(
        &mut board,
        &[
            "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "c2c3", "g8f6", "d2d4", "e5d4",
            "c3d4", "c5b4", "c1d2", "b4d2", "b1d2", "d7d5",
        ],
    );
    let record = GameRecord::from_board(&board, headers()).unwrap();

    let pgn = record.to_pgn();
    let movetext = pgn.split("\n\n").nth(1).unwrap();
    assert!(movetext.lines().count() > 1);
    assert!(movetext.lines().all(|line| line.len() <= LINE_WIDTH));
}

#[test]
fn test_tag_values_are_escaped() {
    assert_eq!(escape_tag(r#"Deep "Blue" \ 2"#), r#"Deep \"Blue\" \\ 2"#);
}

#[test]
fn test_headers_follow_sides() {
    let h = GameHeaders::for_match("Fruit 2.1", Color::White);
    assert_eq!(h.white, "UltraChess");
    assert_eq!(h.black, "Fruit 2.1");
    assert!(h.event.starts_with("UltraChess on OpenMSX versus Fruit 2.1 on "));
    assert_eq!(h.date.len(), 10);
    assert!(!h.site.is_empty());
    assert_eq!(h.site, host_name());
}

#[test]
fn test_site_is_this_host() {
    let system = gethostname::gethostname().to_string_lossy().trim().to_string();
    let expected = if system.is_empty() { "?".to_string() } else { system };
    assert_eq!(host_name(), expected);
    assert!(!host_name().contains('\n'));
}

#[test]
fn test_append_adds_blank_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.pgn");

    let mut board = GameBoard::new();
    play(&mut board, &["e2e4"]);
    let record = GameRecord::from_board(&board, headers()).unwrap();
    record.append_to(&path).unwrap();
    record.append_to(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("[Event ").count(), 2);
    assert!(text.ends_with("1. e4 *\n\n"));
}

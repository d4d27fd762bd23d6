use super::*;

fn mv(text: &str) -> Move {
    text.parse().unwrap()
}

#[test]
fn test_short_castle_for_white() {
    let board = GameBoard::new();
    assert_eq!(to_board_move("O-O", &board, Color::White).unwrap(), mv("e1g1"));
    assert_eq!(to_board_move(" o-o ", &board, Color::White).unwrap(), mv("e1g1"));
}

#[test]
fn test_castles_for_black() {
    let board = GameBoard::new();
    assert_eq!(to_board_move("O-O", &board, Color::Black).unwrap(), mv("e8g8"));
    assert_eq!(to_board_move("o-o-o", &board, Color::Black).unwrap(), mv("e8c8"));
    assert_eq!(to_board_move("0-0-0", &board, Color::White).unwrap(), mv("e1c1"));
}

#[test]
fn test_plain_move_shapes() {
    let board = GameBoard::new();
    for text in ["e2-e4", "E2-E4", "e2e4", "e2 e4", " e2-e4 "] {
        assert_eq!(to_board_move(text, &board, Color::White).unwrap(), mv("e2e4"), "{text}");
    }
}

#[test]
fn test_capture_separator() {
    let board = GameBoard::new();
    assert_eq!(to_board_move("e4xd5", &board, Color::White).unwrap(), mv("e4d5"));
}

#[test]
fn test_pawn_to_last_rank_promotes_to_queen() {
    let board = GameBoard::from_fen("8/4P3/8/8/8/k7/8/K7 w - - 0 1").unwrap();
    assert_eq!(to_board_move("e7e8", &board, Color::White).unwrap(), mv("e7e8q"));
    assert_eq!(to_board_move("e7-e8", &board, Color::White).unwrap(), mv("e7e8q"));

    let board = GameBoard::from_fen("k7/8/8/8/8/8/3p4/K7 b - - 0 1").unwrap();
    assert_eq!(to_board_move("d2-d1", &board, Color::Black).unwrap(), mv("d2d1q"));
}

#[test]
fn test_non_pawn_to_last_rank_is_not_a_promotion() {
    let board = GameBoard::from_fen("8/4R3/8/8/8/k7/8/K7 w - - 0 1").unwrap();
    assert_eq!(to_board_move("e7-e8", &board, Color::White).unwrap(), mv("e7e8"));
}

#[test]
fn test_unparsable_notation() {
    let board = GameBoard::new();
    for text in ["", "     ", "check", "e9-e4", "e2-e", "z2-e4", "e2--e4"] {
        match to_board_move(text, &board, Color::White) {
            Err(BridgeError::UnparsableNotation { text: t }) => assert_eq!(t, text),
            other => panic!("{text:?} should not parse, got {other:?}"),
        }
    }
}

#[test]
fn test_keystrokes_are_square_pairs() {
    let keys = to_screen_keystrokes(mv("g1f3"));
    assert_eq!(keys.origin_text(), "g1");
    assert_eq!(keys.destination_text(), "f3");
    assert_eq!(keys.to_string(), "g1-f3");

    // Castling and promotion are inferred by the program from the squares.
    assert_eq!(to_screen_keystrokes(mv("e1g1")).to_string(), "e1-g1");
    assert_eq!(to_screen_keystrokes(mv("a7a8q")).to_string(), "a7-a8");
}

#[test]
fn test_plain_moves_round_trip() {
    let board = GameBoard::new();
    for m in board.legal_moves() {
        let keys = to_screen_keystrokes(m);
        let back = to_board_move(&keys.to_string(), &board, Color::White).unwrap();
        assert_eq!(back, m);
    }
}

use super::*;
use std::io::Cursor;
use std::time::Instant;

/// Never produces a byte within the test's lifetime.
struct Silent;

impl Read for Silent {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_secs(2));
        Ok(0)
    }
}

#[test]
fn test_reads_lines_in_order() {
    let reader = LineReader::spawn("engine", Cursor::new(b"id name Foo\nuciok\n".to_vec())).unwrap();
    let deadline = Deadline::after("uci handshake", Duration::from_secs(1));
    assert_eq!(reader.next_line(&deadline).unwrap(), "id name Foo");
    assert_eq!(reader.next_line(&deadline).unwrap(), "uciok");
}

#[test]
fn test_closed_output_is_a_collaborator_failure() {
    let reader = LineReader::spawn("engine", Cursor::new(Vec::new())).unwrap();
    let deadline = Deadline::after("search", Duration::from_secs(1));
    match reader.next_line(&deadline) {
        Err(BridgeError::CollaboratorFailure { collaborator, .. }) => {
            assert_eq!(collaborator, "engine")
        }
        other => panic!("expected collaborator failure, got {other:?}"),
    }
}

#[test]
fn test_silent_child_stalls() {
    let reader = LineReader::spawn("emulator", Silent).unwrap();
    let deadline = Deadline::after("keyboard ack", Duration::from_millis(50));
    let start = Instant::now();
    let err = reader.next_line(&deadline).unwrap_err();
    assert!(matches!(err, BridgeError::StallTimeout { what: "keyboard ack", .. }));
    assert!(start.elapsed() < Duration::from_secs(1));
}

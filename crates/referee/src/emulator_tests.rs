use super::*;
use std::path::PathBuf;

#[test]
fn test_dump_script_renames_atomically() {
    let script = dump_script(
        Path::new("/tmp/run/vram.bin"),
        Duration::from_millis(500),
        false,
    );
    assert!(script.contains("save_debuggable VRAM {/tmp/run/vram.bin.tmp} 0 16384"));
    assert!(script.contains("file rename -force -- {/tmp/run/vram.bin.tmp} {/tmp/run/vram.bin}"));
    assert!(script.contains("after realtime 0.5 referee_dump"));
    assert!(script.contains("set power 1"));
    assert!(!script.contains("throttle"));
    assert!(script.ends_with("after realtime 0.5 referee_dump\n"));
}

#[test]
fn test_dump_script_max_speed() {
    let script = dump_script(Path::new("vram.bin"), Duration::from_millis(250), true);
    assert!(script.contains("set throttle off"));
    assert!(script.contains("after realtime 0.25 referee_dump"));
}

#[test]
fn test_scratch_holds_script_and_is_removed() {
    let settings = EmulatorSettings {
        dump_interval_ms: 200,
        ..EmulatorSettings::default()
    };
    let scratch = write_scratch(&settings).unwrap();
    let dir = scratch.path().to_path_buf();
    assert!(dir.starts_with(std::env::temp_dir()));

    let script = std::fs::read_to_string(dir.join(SCRIPT_FILE)).unwrap();
    let vram = dir.join(VRAM_FILE);
    assert!(script.contains(&format!("{{{}}}", vram.display())));
    assert!(script.contains("after realtime 0.2 referee_dump"));

    remove_scratch(scratch);
    assert!(!dir.exists());
}

#[test]
fn test_missing_binary_cleans_up() {
    let settings = EmulatorSettings {
        binary: PathBuf::from("/nonexistent/openmsx"),
        ..EmulatorSettings::default()
    };
    let result = launch(&settings, Duration::from_millis(10));
    assert!(matches!(
        result,
        Err(BridgeError::CollaboratorFailure {
            collaborator: "emulator",
            ..
        })
    ));
}

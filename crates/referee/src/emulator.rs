//! openMSX as a subprocess: startup script, control channel and cleanup.
//!
//! The emulator runs with `-control stdio`, so its stdin/stdout carry the
//! XML control protocol that the [`KeyboardDriver`](crate::keyboard::KeyboardDriver)
//! speaks. A small Tcl script makes it dump VRAM to a scratch file every few
//! hundred milliseconds; [`VramSnapshot`] reads that file back.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use bridge_core::{BridgeError, Deadline, Result, VramSnapshot};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::child::{kill_child, LineReader};
use crate::config::EmulatorSettings;
use crate::keyboard::ControlLink;

const OPEN_SESSION: &str = "<openmsx-control>\r\n";
const CLOSE_SESSION: &str = "</openmsx-control>\r\n";

/// Tcl that dumps the whole 16 KiB of VRAM to `vram` every `period`.
///
/// The dump is written beside the target and renamed over it, so a reader
/// never sees a half-written file.
pub fn dump_script(vram: &Path, period: Duration, max_speed: bool) -> String {
    let target = vram.display();
    let partial = format!("{target}.tmp");
    let period = period.as_secs_f64();

    let mut script = String::new();
    script.push_str("proc referee_dump {} {\n");
    script.push_str(&format!("    save_debuggable VRAM {{{partial}}} 0 16384\n"));
    script.push_str(&format!("    file rename -force -- {{{partial}}} {{{target}}}\n"));
    script.push_str(&format!("    after realtime {period} referee_dump\n"));
    script.push_str("}\n\n");
    script.push_str("set power 1\n");
    if max_speed {
        script.push_str("set throttle off\n");
    }
    script.push_str(&format!("\nafter realtime {period} referee_dump\n"));
    script
}

const VRAM_FILE: &str = "vram.bin";
const SCRIPT_FILE: &str = "dump.tcl";

/// Scratch directory holding the dump script; the dumps land beside it.
/// Removed when the returned handle is dropped or closed.
fn write_scratch(settings: &EmulatorSettings) -> Result<TempDir> {
    let scratch = tempfile::Builder::new().prefix("referee-").tempdir()?;
    let script = dump_script(
        &scratch.path().join(VRAM_FILE),
        Duration::from_millis(settings.dump_interval_ms),
        settings.max_speed,
    );
    fs::write(scratch.path().join(SCRIPT_FILE), script)?;
    Ok(scratch)
}

/// Start openMSX and open its control session.
///
/// Returns the control link and a screen source reading the VRAM dumps,
/// retrying every `retry_interval` until a dump exists.
pub fn launch(
    settings: &EmulatorSettings,
    retry_interval: Duration,
) -> Result<(OpenMsxLink, VramSnapshot)> {
    let scratch = write_scratch(settings)?;
    let vram = scratch.path().join(VRAM_FILE);
    let script = scratch.path().join(SCRIPT_FILE);

    let spawned = Command::new(&settings.binary)
        .arg("-machine")
        .arg(&settings.machine)
        .arg("-diska")
        .arg(&settings.disk_image)
        .arg("-script")
        .arg(&script)
        .arg("-control")
        .arg("stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            return Err(BridgeError::collaborator(
                "emulator",
                format!("cannot start {}: {e}", settings.binary.display()),
            ));
        }
    };

    let pipes = child.stdin.take().zip(child.stdout.take());
    let Some((stdin, stdout)) = pipes else {
        kill_child("emulator", &mut child);
        return Err(BridgeError::collaborator("emulator", "stdio pipes unavailable"));
    };
    let stdout = match LineReader::spawn("emulator", stdout) {
        Ok(reader) => reader,
        Err(e) => {
            kill_child("emulator", &mut child);
            return Err(e.into());
        }
    };

    let mut link = OpenMsxLink {
        child,
        stdin: BufWriter::new(stdin),
        stdout,
        scratch: Some(scratch),
        closed: false,
    };
    link.write_frame(OPEN_SESSION)?;
    info!(
        machine = %settings.machine,
        disk = %settings.disk_image.display(),
        "openMSX started"
    );

    Ok((link, VramSnapshot::new(vram, retry_interval)))
}

/// Control channel to a running openMSX.
pub struct OpenMsxLink {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: LineReader,
    scratch: Option<TempDir>,
    closed: bool,
}

impl ControlLink for OpenMsxLink {
    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.stdin.write_all(frame.as_bytes())?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, deadline: &Deadline) -> Result<String> {
        self.stdout.next_line(deadline)
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.write_frame(CLOSE_SESSION) {
            debug!(error = %e, "could not close control session");
        }
        kill_child("emulator", &mut self.child);
        if let Some(scratch) = self.scratch.take() {
            remove_scratch(scratch);
        }
    }
}

impl Drop for OpenMsxLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn remove_scratch(scratch: TempDir) {
    let dir = scratch.path().to_path_buf();
    match scratch.close() {
        Ok(()) => debug!(dir = %dir.display(), "scratch directory removed"),
        Err(e) => warn!(dir = %dir.display(), error = %e, "failed to remove scratch directory"),
    }
}

#[cfg(test)]
#[path = "emulator_tests.rs"]
mod emulator_tests;

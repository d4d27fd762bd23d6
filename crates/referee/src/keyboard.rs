//! Keyboard Driver: acknowledged commands over openMSX's control channel.
//!
//! Requests are framed as `<command>…</command>` and each is answered by a
//! reply carrying `result="ok"` (or `"nok"`). The channel is strictly
//! request/acknowledge: a new command is never written before the previous
//! one has been answered. The driver sets no timeout of its own; every send
//! runs under a deadline armed by the synchronizer's watchdog.

use bridge_core::{BridgeError, Deadline, Result};
use tracing::debug;

/// Raw transport to the emulator's control channel.
pub trait ControlLink {
    /// Write one complete, already framed request.
    fn write_frame(&mut self, frame: &str) -> Result<()>;

    /// Read the next line of output, failing once `deadline` passes.
    fn read_line(&mut self, deadline: &Deadline) -> Result<String>;

    /// Close the channel and stop the process behind it.
    fn shutdown(&mut self) {}
}

/// Reply that acknowledged a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub reply: String,
}

const OK_MARKER: &str = r#"result="ok""#;
const NOK_MARKER: &str = r#"result="nok""#;

pub struct KeyboardDriver {
    link: Box<dyn ControlLink>,
    /// Command written but not yet acknowledged
    pending: Option<String>,
}

impl KeyboardDriver {
    pub fn new(link: Box<dyn ControlLink>) -> Self {
        Self {
            link,
            pending: None,
        }
    }

    /// Command still waiting for its acknowledgment, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Send one command and block until it is acknowledged.
    ///
    /// If an earlier command was left unacknowledged (its wait failed), the
    /// emulator's state is unknown and every later send fails.
    pub fn send(&mut self, command: &str, deadline: &Deadline) -> Result<Ack> {
        if let Some(previous) = &self.pending {
            return Err(BridgeError::collaborator(
                "emulator",
                format!("command {previous:?} was never acknowledged"),
            ));
        }

        debug!("> {command}");
        self.link
            .write_frame(&format!("<command>{}</command>\r\n", escape_xml(command)))?;
        self.pending = Some(command.to_string());

        loop {
            let reply = self.link.read_line(deadline)?;
            debug!("< {}", reply.trim_end());
            if reply.contains(OK_MARKER) {
                self.pending = None;
                return Ok(Ack { reply });
            }
            if reply.contains(NOK_MARKER) {
                self.pending = None;
                return Err(BridgeError::collaborator(
                    "emulator",
                    format!("command {command:?} rejected: {}", reply.trim()),
                ));
            }
        }
    }

    /// Type `text` on the emulated keyboard, releasing every key.
    pub fn type_text(&mut self, text: &str, deadline: &Deadline) -> Result<Ack> {
        self.send(
            &format!("type_via_keyboard -release -freq 2 \"{text}\""),
            deadline,
        )
    }

    pub fn shutdown(&mut self) {
        self.link.shutdown();
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[path = "keyboard_tests.rs"]
mod keyboard_tests;

pub mod channel;
pub mod interpreter;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::types::ShellConfig;
use crate::error::SessionError;
use crate::telemetry::events::TelemetryEvent;
use crate::telemetry::TelemetryLogger;
use crate::utils::escape_bytes;
use channel::ShellChannel;
use interpreter::CommandInterpreter;

pub const KEY_UP: &[u8] = b"\x1b[A";
pub const KEY_DOWN: &[u8] = b"\x1b[B";
pub const KEY_RIGHT: &[u8] = b"\x1b[C";
pub const KEY_LEFT: &[u8] = b"\x1b[D";
pub const KEY_BACKSPACE: &[u8] = b"\x7f";

/// Chunks that are swallowed whole: never echoed, never part of a command.
pub const RESERVED_SEQUENCES: [&[u8]; 5] = [KEY_UP, KEY_DOWN, KEY_RIGHT, KEY_LEFT, KEY_BACKSPACE];

/// Upper bound on an assembled line before the session is dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

pub fn is_reserved_sequence(chunk: &[u8]) -> bool {
    RESERVED_SEQUENCES.contains(&chunk)
}

/// How a shell loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// Attacker typed `exit`.
    Exit,
    /// Channel closed or an empty read.
    Disconnected,
}

impl ShellExit {
    pub fn reason(&self) -> &'static str {
        match self {
            ShellExit::Exit => "exit",
            ShellExit::Disconnected => "disconnected",
        }
    }
}

/// Per-session prompt/echo/line-assembly loop.
pub struct FakeShell {
    prompt: String,
    welcome: String,
    receive_timeout: Duration,
    interpreter: Arc<CommandInterpreter>,
    telemetry: Arc<TelemetryLogger>,
    peer: SocketAddr,
    session_id: String,
}

impl FakeShell {
    pub fn new(
        config: &ShellConfig,
        receive_timeout: Duration,
        interpreter: Arc<CommandInterpreter>,
        telemetry: Arc<TelemetryLogger>,
        peer: SocketAddr,
        session_id: &str,
    ) -> Self {
        Self {
            prompt: config.prompt.clone(),
            welcome: config.welcome.clone(),
            receive_timeout,
            interpreter,
            telemetry,
            peer,
            session_id: session_id.to_string(),
        }
    }

    /// Drive the shell until `exit`, a disconnect, or an error.
    pub async fn run<C: ShellChannel>(&self, channel: &mut C) -> Result<ShellExit, SessionError> {
        if !self.welcome.is_empty() {
            channel.send(self.welcome.as_bytes()).await?;
        }

        loop {
            channel.send(self.prompt.as_bytes()).await?;

            let line = match self.read_line(channel).await? {
                Some(line) => line,
                None => return Ok(ShellExit::Disconnected),
            };
            channel.send(b"\r\n").await?;

            let command = line.trim_end();
            self.telemetry
                .log(TelemetryEvent::command(&self.peer, &self.session_id, command));

            if command == "exit" {
                debug!(conn_id = %self.session_id, peer = %self.peer, "Shell exit requested");
                return Ok(ShellExit::Exit);
            }

            let response = self
                .interpreter
                .respond(&self.peer, &self.session_id, command);
            let mut out = response.into_bytes();
            out.extend_from_slice(b"\r\n");
            channel.send(&out).await?;
        }
    }

    /// Accumulate chunks until one carries a carriage return.
    ///
    /// The whole terminating chunk is kept, so bytes after a mid-chunk `\r`
    /// end up in the same line. `None` means the client went away.
    async fn read_line<C: ShellChannel>(
        &self,
        channel: &mut C,
    ) -> Result<Option<String>, SessionError> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let chunk = match tokio::time::timeout(self.receive_timeout, channel.receive()).await {
                Ok(Ok(Some(chunk))) if !chunk.is_empty() => chunk,
                Ok(Ok(_)) => return Ok(None),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(SessionError::ReceiveTimeout(self.receive_timeout)),
            };
            trace!(conn_id = %self.session_id, chunk = %escape_bytes(&chunk), "Shell input");

            if is_reserved_sequence(&chunk) {
                continue;
            }

            channel.send(&chunk).await?;
            buf.extend_from_slice(&chunk);
            if buf.len() > MAX_LINE_BYTES {
                return Err(SessionError::LineTooLong(MAX_LINE_BYTES));
            }

            if chunk.contains(&b'\r') {
                return Ok(Some(String::from_utf8_lossy(&buf).into_owned()));
            }
        }
    }
}

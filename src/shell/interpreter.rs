use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::types::ShellConfig;
use crate::telemetry::events::TelemetryEvent;
use crate::telemetry::TelemetryLogger;

/// Maps an attacker command to a canned answer. Nothing is ever executed.
pub struct CommandInterpreter {
    listing: String,
    working_directory: String,
    telemetry: Arc<TelemetryLogger>,
}

impl CommandInterpreter {
    pub fn new(config: &ShellConfig, telemetry: Arc<TelemetryLogger>) -> Self {
        Self {
            listing: config.listing.clone(),
            working_directory: config.working_directory.clone(),
            telemetry,
        }
    }

    /// Case-sensitive prefix match: `ls`, then `pwd`, then not found.
    pub fn response_for(&self, command: &str) -> String {
        if command.starts_with("ls") {
            self.listing.clone()
        } else if command.starts_with("pwd") {
            self.working_directory.clone()
        } else {
            format!("Command not found: {}", command)
        }
    }

    /// Resolve the response and record it against the client before returning it.
    pub fn respond(&self, peer: &SocketAddr, session_id: &str, command: &str) -> String {
        let response = self.response_for(command);
        self.telemetry
            .log(TelemetryEvent::response(peer, session_id, &response));
        response
    }
}

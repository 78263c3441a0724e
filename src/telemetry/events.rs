use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;

/// Severity written on every telemetry line. Only informational events exist today.
pub const LEVEL_INFO: &str = "INFO";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type")]
pub enum TelemetryEvent {
    #[serde(rename = "honeypot.started")]
    Started {
        timestamp: DateTime<Utc>,
        listen: String,
        server_id: String,
    },
    #[serde(rename = "connection.new")]
    ConnectionNew {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
    },
    #[serde(rename = "connection.rejected")]
    ConnectionRejected {
        timestamp: DateTime<Utc>,
        source_ip: String,
        reason: String,
    },
    #[serde(rename = "client.version")]
    ClientVersion {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        version: String,
    },
    #[serde(rename = "channel.open")]
    ChannelOpen {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        kind: String,
        accepted: bool,
    },
    #[serde(rename = "auth.methods")]
    AuthMethods {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        username: String,
        methods: Vec<String>,
    },
    #[serde(rename = "auth.publickey")]
    AuthPublicKey {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        username: String,
        algorithm: String,
        fingerprint: String,
        base64: String,
        bits: u32,
    },
    #[serde(rename = "auth.password")]
    AuthPassword {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    #[serde(rename = "request.pty")]
    PtyRequest {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        term: String,
        cols: u32,
        rows: u32,
    },
    #[serde(rename = "request.exec")]
    ExecRequest {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        command: String,
    },
    #[serde(rename = "shell.command")]
    Command {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        command: String,
    },
    #[serde(rename = "shell.response")]
    Response {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        response: String,
    },
    #[serde(rename = "session.closed")]
    SessionClosed {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        reason: String,
        duration_secs: u64,
    },
    #[serde(rename = "session.error")]
    SessionError {
        timestamp: DateTime<Utc>,
        session_id: String,
        source_ip: String,
        error_class: String,
        error: String,
    },
}

impl TelemetryEvent {
    pub fn started(listen: &SocketAddr, server_id: &str) -> Self {
        Self::Started {
            timestamp: Utc::now(),
            listen: listen.to_string(),
            server_id: server_id.to_string(),
        }
    }

    pub fn connection_new(source: &SocketAddr, sid: &str) -> Self {
        Self::ConnectionNew {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
        }
    }

    pub fn connection_rejected(source: &SocketAddr, reason: &str) -> Self {
        Self::ConnectionRejected {
            timestamp: Utc::now(),
            source_ip: source.ip().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn client_version(source: &SocketAddr, sid: &str, version: &str) -> Self {
        Self::ClientVersion {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            version: version.to_string(),
        }
    }

    pub fn channel_open(source: &SocketAddr, sid: &str, kind: &str, accepted: bool) -> Self {
        Self::ChannelOpen {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            kind: kind.to_string(),
            accepted,
        }
    }

    pub fn auth_methods(source: &SocketAddr, sid: &str, username: &str, methods: &[&str]) -> Self {
        Self::AuthMethods {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            username: username.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn auth_publickey(
        source: &SocketAddr,
        sid: &str,
        username: &str,
        key: &crate::ssh::pubkey::KeyDescription,
    ) -> Self {
        Self::AuthPublicKey {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            username: username.to_string(),
            algorithm: key.algorithm.clone(),
            fingerprint: key.fingerprint.clone(),
            base64: key.base64.clone(),
            bits: key.bits,
        }
    }

    pub fn auth_password(
        source: &SocketAddr,
        sid: &str,
        username: &str,
        password: Option<&str>,
    ) -> Self {
        Self::AuthPassword {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            username: username.to_string(),
            password: password.map(str::to_string),
        }
    }

    pub fn pty_request(source: &SocketAddr, sid: &str, term: &str, cols: u32, rows: u32) -> Self {
        Self::PtyRequest {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            term: term.to_string(),
            cols,
            rows,
        }
    }

    pub fn exec_request(
        source: &SocketAddr,
        sid: &str,
        username: Option<&str>,
        command: &str,
    ) -> Self {
        Self::ExecRequest {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            username: username.map(str::to_string),
            command: command.to_string(),
        }
    }

    pub fn command(source: &SocketAddr, sid: &str, command: &str) -> Self {
        Self::Command {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            command: command.to_string(),
        }
    }

    pub fn response(source: &SocketAddr, sid: &str, response: &str) -> Self {
        Self::Response {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            response: response.to_string(),
        }
    }

    pub fn session_closed(source: &SocketAddr, sid: &str, reason: &str, duration_secs: u64) -> Self {
        Self::SessionClosed {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            reason: reason.to_string(),
            duration_secs,
        }
    }

    pub fn session_error(source: &SocketAddr, sid: &str, error_class: &str, error: &str) -> Self {
        Self::SessionError {
            timestamp: Utc::now(),
            session_id: sid.to_string(),
            source_ip: source.ip().to_string(),
            error_class: error_class.to_string(),
            error: error.to_string(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "honeypot.started",
            Self::ConnectionNew { .. } => "connection.new",
            Self::ConnectionRejected { .. } => "connection.rejected",
            Self::ClientVersion { .. } => "client.version",
            Self::ChannelOpen { .. } => "channel.open",
            Self::AuthMethods { .. } => "auth.methods",
            Self::AuthPublicKey { .. } => "auth.publickey",
            Self::AuthPassword { .. } => "auth.password",
            Self::PtyRequest { .. } => "request.pty",
            Self::ExecRequest { .. } => "request.exec",
            Self::Command { .. } => "shell.command",
            Self::Response { .. } => "shell.response",
            Self::SessionClosed { .. } => "session.closed",
            Self::SessionError { .. } => "session.error",
        }
    }

    /// Client address the event is attributed to, if any.
    pub fn source_ip(&self) -> Option<&str> {
        match self {
            Self::Started { .. } => None,
            Self::ConnectionNew { source_ip, .. }
            | Self::ConnectionRejected { source_ip, .. }
            | Self::ClientVersion { source_ip, .. }
            | Self::ChannelOpen { source_ip, .. }
            | Self::AuthMethods { source_ip, .. }
            | Self::AuthPublicKey { source_ip, .. }
            | Self::AuthPassword { source_ip, .. }
            | Self::PtyRequest { source_ip, .. }
            | Self::ExecRequest { source_ip, .. }
            | Self::Command { source_ip, .. }
            | Self::Response { source_ip, .. }
            | Self::SessionClosed { source_ip, .. }
            | Self::SessionError { source_ip, .. } => Some(source_ip),
        }
    }

    /// Human-readable line stored next to the structured fields.
    pub fn message(&self) -> String {
        match self {
            Self::Started {
                listen, server_id, ..
            } => format!(
                "Honeypot is recording activity on {} as '{}'",
                listen, server_id
            ),
            Self::ConnectionNew { source_ip, .. } => format!("New connection from: {}", source_ip),
            Self::ConnectionRejected {
                source_ip, reason, ..
            } => format!("Connection from {} dropped: {}", source_ip, reason),
            Self::ClientVersion {
                source_ip, version, ..
            } => format!("Client SSH version ({}): {}", source_ip, version),
            Self::ChannelOpen {
                source_ip,
                kind,
                accepted,
                ..
            } => format!(
                "client called check_channel_request ({}): {} ({})",
                source_ip,
                kind,
                if *accepted { "accepted" } else { "rejected" }
            ),
            Self::AuthMethods {
                source_ip,
                username,
                ..
            } => format!(
                "client called get_allowed_auths ({}) with username {}",
                source_ip, username
            ),
            Self::AuthPublicKey {
                source_ip,
                username,
                algorithm,
                fingerprint,
                base64,
                bits,
                ..
            } => format!(
                "client public key ({}): username: {}, key name: {}, fingerprint: {}, base64: {}, bits: {}",
                source_ip, username, algorithm, fingerprint, base64, bits
            ),
            Self::AuthPassword {
                source_ip,
                username,
                ..
            } => format!("Login attempt from {} with username: {}", source_ip, username),
            Self::PtyRequest {
                source_ip,
                term,
                cols,
                rows,
                ..
            } => format!("Client pty request ({}): {} {}x{}", source_ip, term, cols, rows),
            Self::ExecRequest {
                source_ip,
                username,
                command,
                ..
            } => format!(
                "Client sent command via exec request ({}): Username: {}, Command: {}",
                source_ip,
                username.as_deref().unwrap_or("-"),
                command
            ),
            Self::Command {
                source_ip, command, ..
            } => format!("Command received ({}): {}", source_ip, command),
            Self::Response {
                source_ip,
                response,
                ..
            } => format!("Response from honeypot ({}): {}", source_ip, response),
            Self::SessionClosed {
                source_ip, reason, ..
            } => format!("Session closed ({}): {}", source_ip, reason),
            Self::SessionError {
                source_ip,
                error_class,
                error,
                ..
            } => format!("Exception ({}): {}: {}", source_ip, error_class, error),
        }
    }
}

/// One line of the telemetry file.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub level: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub event: TelemetryEvent,
}

impl From<TelemetryEvent> for TelemetryRecord {
    fn from(event: TelemetryEvent) -> Self {
        Self {
            level: LEVEL_INFO,
            message: event.message(),
            event,
        }
    }
}

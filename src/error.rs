use std::time::Duration;
use thiserror::Error;

/// Why a single honeypot session ended abnormally.
///
/// None of these escape the session's own task; the orchestrator logs the
/// variant name as the error class and moves on.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SSH negotiation failed: {0}")]
    Negotiation(String),
    #[error("transport closed before a channel was opened")]
    TransportClosed,
    #[error("no channel opened within {0:?}")]
    NoChannel(Duration),
    #[error("client never asked for a shell within {0:?}")]
    NoShellRequest(Duration),
    #[error("no input received within {0:?}")]
    ReceiveTimeout(Duration),
    #[error("input line exceeded {0} bytes")]
    LineTooLong(usize),
    #[error("channel error: {0}")]
    Channel(#[from] russh::Error),
}

impl SessionError {
    /// Stable name logged as the error class.
    pub fn class(&self) -> &'static str {
        match self {
            SessionError::Negotiation(_) => "Negotiation",
            SessionError::TransportClosed => "TransportClosed",
            SessionError::NoChannel(_) => "NoChannel",
            SessionError::NoShellRequest(_) => "NoShellRequest",
            SessionError::ReceiveTimeout(_) => "ReceiveTimeout",
            SessionError::LineTooLong(_) => "LineTooLong",
            SessionError::Channel(_) => "Channel",
        }
    }
}

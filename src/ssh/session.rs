use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::utils::generate_session_id;

/// One-shot "shell requested" signal for a single session.
///
/// The handler raises it from the shell request callback; the connection
/// task waits on it with a deadline. Raising it again is a no-op.
#[derive(Debug)]
pub struct ShellGrant {
    tx: watch::Sender<bool>,
}

impl ShellGrant {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn grant(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_granted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait up to `timeout` for the grant. Returns immediately if already granted.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        let granted = tokio::time::timeout(timeout, async {
            rx.wait_for(|granted| *granted).await.is_ok()
        })
        .await;
        granted.unwrap_or(false)
    }
}

impl Default for ShellGrant {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-client session state
#[derive(Debug)]
pub struct ClientSession {
    pub id: String,
    pub peer: SocketAddr,
    /// Last username offered on any auth callback.
    pub username: Option<String>,
    pub shell: Arc<ShellGrant>,
    pub connected_at: Instant,
}

impl ClientSession {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: generate_session_id(),
            peer,
            username: None,
            shell: Arc::new(ShellGrant::new()),
            connected_at: Instant::now(),
        }
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }
}

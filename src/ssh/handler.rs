use std::sync::Arc;

use russh::keys::PublicKey;
use russh::server::{Auth, Msg, Session};
use russh::{Channel, ChannelId, MethodKind, MethodSet};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::ssh::pubkey;
use crate::ssh::session::ClientSession;
use crate::telemetry::events::TelemetryEvent;
use crate::telemetry::TelemetryLogger;

/// Methods advertised to every client, in this order.
pub const ALLOWED_METHODS: [&str; 2] = ["publickey", "password"];

pub const CHANNEL_KIND_SESSION: &str = "session";
pub const CHANNEL_KIND_DIRECT_TCPIP: &str = "direct-tcpip";
pub const CHANNEL_KIND_X11: &str = "x11";

pub fn allowed_methods() -> MethodSet {
    MethodSet::from([MethodKind::PublicKey, MethodKind::Password].as_slice())
}

/// Per-connection russh handler.
///
/// Every credential is accepted and recorded. The first session channel is
/// handed to the connection task through `channel_tx`; the shell request
/// raises the session's shell grant.
pub struct HoneypotHandler {
    telemetry: Arc<TelemetryLogger>,
    session: ClientSession,
    log_passwords: bool,
    channel_tx: Option<oneshot::Sender<Channel<Msg>>>,
    version_logged: bool,
}

impl HoneypotHandler {
    pub fn new(
        telemetry: Arc<TelemetryLogger>,
        session: ClientSession,
        log_passwords: bool,
        channel_tx: oneshot::Sender<Channel<Msg>>,
    ) -> Self {
        Self {
            telemetry,
            session,
            log_passwords,
            channel_tx: Some(channel_tx),
            version_logged: false,
        }
    }

    pub fn on_auth_methods_query(&mut self, user: &str) -> Auth {
        self.session.set_username(user);
        self.telemetry.log(TelemetryEvent::auth_methods(
            &self.session.peer,
            &self.session.id,
            user,
            &ALLOWED_METHODS,
        ));
        Auth::Reject {
            proceed_with_methods: Some(allowed_methods()),
            partial_success: false,
        }
    }

    pub fn on_password(&mut self, user: &str, password: &str) -> Auth {
        self.session.set_username(user);
        let recorded = self.log_passwords.then_some(password);
        self.telemetry.log(TelemetryEvent::auth_password(
            &self.session.peer,
            &self.session.id,
            user,
            recorded,
        ));
        Auth::Accept
    }

    pub fn on_publickey(&mut self, user: &str, key: &PublicKey) -> Auth {
        self.session.set_username(user);
        let desc = pubkey::describe(key);
        debug!(
            conn_id = %self.session.id,
            user = %user,
            fingerprint = %desc.fingerprint,
            "Public key offered"
        );
        self.telemetry.log(TelemetryEvent::auth_publickey(
            &self.session.peer,
            &self.session.id,
            user,
            &desc,
        ));
        Auth::Accept
    }

    /// Record the client identification string once per connection.
    pub fn on_client_version(&mut self, raw: &[u8]) {
        if self.version_logged {
            return;
        }
        self.version_logged = true;
        let version = String::from_utf8_lossy(raw);
        self.telemetry.log(TelemetryEvent::client_version(
            &self.session.peer,
            &self.session.id,
            version.trim_end(),
        ));
    }

    /// Only `session` channels are accepted.
    pub fn on_channel_open(&mut self, kind: &str) -> bool {
        let accepted = kind == CHANNEL_KIND_SESSION;
        self.telemetry.log(TelemetryEvent::channel_open(
            &self.session.peer,
            &self.session.id,
            kind,
            accepted,
        ));
        accepted
    }

    pub fn on_pty(&mut self, term: &str, cols: u32, rows: u32) {
        self.telemetry.log(TelemetryEvent::pty_request(
            &self.session.peer,
            &self.session.id,
            term,
            cols,
            rows,
        ));
    }

    pub fn on_shell(&mut self) {
        self.session.shell.grant();
    }

    /// Log the command as sent; it is never run.
    pub fn on_exec(&mut self, data: &[u8]) {
        let command = String::from_utf8_lossy(data);
        self.telemetry.log(TelemetryEvent::exec_request(
            &self.session.peer,
            &self.session.id,
            self.session.username.as_deref(),
            &command,
        ));
    }

    /// Hand the channel to the waiting connection task.
    ///
    /// Returns `false` when nobody is waiting any more. Later session
    /// channels are accepted but never served.
    fn hand_off(&mut self, channel: Channel<Msg>) -> bool {
        match self.channel_tx.take() {
            Some(tx) => tx.send(channel).is_ok(),
            None => {
                debug!(conn_id = %self.session.id, "Additional session channel left idle");
                true
            }
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username.as_deref()
    }
}

impl russh::server::Handler for HoneypotHandler {
    type Error = anyhow::Error;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        Ok(self.on_auth_methods_query(user))
    }

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        Ok(self.on_password(user, password))
    }

    /// Offers are accepted unlogged; the signed attempt that follows is recorded.
    async fn auth_publickey_offered(
        &mut self,
        user: &str,
        _public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        self.session.set_username(user);
        Ok(Auth::Accept)
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        Ok(self.on_publickey(user, public_key))
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.on_client_version(session.remote_sshid());
        if !self.on_channel_open(CHANNEL_KIND_SESSION) {
            return Ok(false);
        }
        Ok(self.hand_off(channel))
    }

    async fn channel_open_direct_tcpip(
        &mut self,
        _channel: Channel<Msg>,
        host_to_connect: &str,
        port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.session.id,
            peer = %self.session.peer,
            destination = %format!("{}:{}", host_to_connect, port_to_connect),
            "Port forwarding refused"
        );
        Ok(self.on_channel_open(CHANNEL_KIND_DIRECT_TCPIP))
    }

    async fn channel_open_x11(
        &mut self,
        _channel: Channel<Msg>,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(self.on_channel_open(CHANNEL_KIND_X11))
    }

    #[allow(clippy::too_many_arguments)]
    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.on_pty(term, col_width, row_height);
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(conn_id = %self.session.id, "Shell requested");
        self.on_shell();
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.on_exec(data);
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(conn_id = %self.session.id, subsystem = %name, "Subsystem refused");
        let _ = session.channel_failure(channel);
        Ok(())
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use russh::server::{Handle, Msg};
use russh::{Channel, Disconnect};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::context::HoneypotContext;
use crate::error::SessionError;
use crate::shell::{FakeShell, ShellExit};
use crate::ssh::handler::HoneypotHandler;
use crate::ssh::session::ClientSession;
use crate::telemetry::events::TelemetryEvent;

/// How long the transport gets to flush a disconnect before it is aborted.
const TEARDOWN_GRACE: Duration = Duration::from_secs(2);

/// Serve one accepted socket from handshake to teardown.
///
/// Never fails: every outcome ends up in telemetry as a close reason,
/// preceded by an error event when the session ended abnormally.
pub async fn handle_connection(ctx: Arc<HoneypotContext>, stream: TcpStream, peer: SocketAddr) {
    let session = ClientSession::new(peer);
    let session_id = session.id.clone();
    let connected_at = session.connected_at;

    debug!(conn_id = %session_id, peer = %peer, "Connection accepted");
    ctx.telemetry
        .log(TelemetryEvent::connection_new(&peer, &session_id));

    let reason = match run_session(&ctx, stream, session).await {
        Ok(exit) => exit.reason().to_string(),
        Err(e) => {
            warn!(conn_id = %session_id, peer = %peer, error = %e, "Session aborted: {}", e.class());
            ctx.telemetry.log(TelemetryEvent::session_error(
                &peer,
                &session_id,
                e.class(),
                &e.to_string(),
            ));
            e.to_string()
        }
    };

    let duration = connected_at.elapsed().as_secs();
    ctx.telemetry.log(TelemetryEvent::session_closed(
        &peer,
        &session_id,
        &reason,
        duration,
    ));
    debug!(conn_id = %session_id, duration_secs = duration, "Worker finished");
}

/// AWAITING_CHANNEL -> AWAITING_SHELL_GRANT -> SHELL_ACTIVE.
///
/// The channel deadline covers the SSH handshake too.
async fn run_session(
    ctx: &HoneypotContext,
    stream: TcpStream,
    session: ClientSession,
) -> Result<ShellExit, SessionError> {
    let timeouts = &ctx.config.timeouts;
    let peer = session.peer;
    let session_id = session.id.clone();
    let grant = session.shell.clone();

    let (channel_tx, channel_rx) = oneshot::channel::<Channel<Msg>>();
    let handler = HoneypotHandler::new(
        ctx.telemetry.clone(),
        session,
        ctx.config.logging.log_passwords,
        channel_tx,
    );

    let deadline = Instant::now() + timeouts.channel_accept();
    let running = match tokio::time::timeout_at(
        deadline,
        russh::server::run_stream(ctx.ssh_config.clone(), stream, handler),
    )
    .await
    {
        Ok(Ok(running)) => running,
        Ok(Err(e)) => return Err(SessionError::Negotiation(e.to_string())),
        Err(_) => return Err(SessionError::NoChannel(timeouts.channel_accept())),
    };
    let handle = running.handle();
    let mut transport = tokio::spawn(running);

    let mut channel = match tokio::time::timeout_at(deadline, channel_rx).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(_)) => {
            // handler dropped: the transport ended without opening a channel
            return Err(match (&mut transport).await {
                Ok(Err(e)) => SessionError::Negotiation(e.to_string()),
                _ => SessionError::TransportClosed,
            });
        }
        Err(_) => {
            shutdown(&handle, transport).await;
            return Err(SessionError::NoChannel(timeouts.channel_accept()));
        }
    };
    debug!(conn_id = %session_id, channel = ?channel.id(), "Session channel open");

    if !grant.wait(timeouts.shell_request()).await {
        let _ = channel.close().await;
        shutdown(&handle, transport).await;
        return Err(SessionError::NoShellRequest(timeouts.shell_request()));
    }

    let shell = FakeShell::new(
        &ctx.config.shell,
        timeouts.receive(),
        ctx.interpreter.clone(),
        ctx.telemetry.clone(),
        peer,
        &session_id,
    );
    let outcome = shell.run(&mut channel).await;

    let _ = channel.close().await;
    shutdown(&handle, transport).await;
    outcome
}

/// Best-effort transport teardown; errors are ignored.
async fn shutdown(handle: &Handle, mut transport: JoinHandle<Result<(), anyhow::Error>>) {
    let _ = handle
        .disconnect(
            Disconnect::ByApplication,
            "session closed".to_string(),
            "en".to_string(),
        )
        .await;
    if tokio::time::timeout(TEARDOWN_GRACE, &mut transport)
        .await
        .is_err()
    {
        transport.abort();
    }
}

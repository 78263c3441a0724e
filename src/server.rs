use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::types::{AppConfig, ServerConfig};
use crate::config::MIN_BACKLOG;
use crate::context::HoneypotContext;
use crate::ssh::{connection, keys};
use crate::telemetry::events::TelemetryEvent;
use crate::telemetry::TelemetryLogger;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Load the host key, open the telemetry log, bind, and serve forever.
///
/// Returns only on a setup failure. Queued telemetry is flushed first.
pub async fn run(config: AppConfig) -> Result<()> {
    let host_key = keys::load_or_generate_host_key(&config.server.host_key_path)?;
    let telemetry = Arc::new(TelemetryLogger::open(&config.logging.telemetry_log_path).await?);

    let result = match bind_listener(&config.server) {
        Ok(listener) => {
            let ctx = Arc::new(HoneypotContext::new(config, host_key, telemetry.clone()));
            serve(listener, ctx).await
        }
        Err(e) => Err(e),
    };
    telemetry.flush().await;
    result
}

/// Bind with SO_REUSEADDR and a backlog of at least [`MIN_BACKLOG`].
pub fn bind_listener(server: &ServerConfig) -> Result<TcpListener> {
    let addr = server.listen_addr();
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .context("creating listening socket")?;
    socket
        .set_reuseaddr(true)
        .context("setting SO_REUSEADDR")?;
    socket
        .bind(addr)
        .with_context(|| format!("binding {}", addr))?;
    socket
        .listen(server.backlog.max(MIN_BACKLOG))
        .with_context(|| format!("listening on {}", addr))
}

/// Accept loop. One detached task per connection; the loop never waits on them.
pub async fn serve(listener: TcpListener, ctx: Arc<HoneypotContext>) -> Result<()> {
    let local = listener
        .local_addr()
        .context("reading listener address")?;
    info!(
        listen = %local,
        server_id = %ctx.config.server.server_id,
        "Starting SSH honeypot"
    );
    ctx.telemetry
        .log(TelemetryEvent::started(&local, &ctx.config.server.server_id));

    let limit = ctx.config.server.max_sessions;
    let semaphore = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "SSH accept error");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        let permit = match &semaphore {
            Some(sem) => match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    warn!(peer = %peer, max = limit, "Session limit reached, dropping connection");
                    ctx.telemetry.log(TelemetryEvent::connection_rejected(
                        &peer,
                        "session limit reached",
                    ));
                    drop(stream);
                    continue;
                }
            },
            None => None,
        };

        let ctx = ctx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            connection::handle_connection(ctx, stream, peer).await;
        });
    }
}

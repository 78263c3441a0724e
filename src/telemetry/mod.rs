pub mod events;

use anyhow::{Context, Result};
use events::{TelemetryEvent, TelemetryRecord};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

const TELEMETRY_CHANNEL_CAPACITY: usize = 10_000;

enum WriterMsg {
    Record(TelemetryRecord),
    Flush(oneshot::Sender<()>),
}

/// Append-only attacker telemetry sink.
///
/// Every session worker holds an `Arc` to the same logger. Events are queued
/// to a single writer task, so each JSON line reaches the file whole even
/// when many sessions log at once.
pub struct TelemetryLogger {
    sender: mpsc::Sender<WriterMsg>,
    dropped_count: AtomicU64,
}

impl TelemetryLogger {
    /// Truncate (or create) the telemetry file and start the writer task.
    ///
    /// Must run inside a tokio runtime. Opening failures are returned so the
    /// process can refuse to start without its log.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .with_context(|| format!("opening telemetry log: {}", path.display()))?;

        let (sender, receiver) = mpsc::channel(TELEMETRY_CHANNEL_CAPACITY);
        tokio::spawn(telemetry_writer_task(receiver, file, path.to_path_buf()));

        info!(path = %path.display(), "Telemetry log ready");
        Ok(Self {
            sender,
            dropped_count: AtomicU64::new(0),
        })
    }

    /// Create a logger that discards everything (no tokio runtime required).
    pub fn new_noop() -> Self {
        let (sender, _receiver) = mpsc::channel(1);
        Self {
            sender,
            dropped_count: AtomicU64::new(0),
        }
    }

    /// Number of events dropped because the queue was full or closed
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn log(&self, event: TelemetryEvent) {
        let record = TelemetryRecord::from(event);
        info!(
            event_type = record.event.event_type(),
            peer = record.event.source_ip().unwrap_or("-"),
            "{}",
            record.message
        );
        match self.sender.try_send(WriterMsg::Record(record)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) | Err(mpsc::error::TrySendError::Closed(_)) => {
                let dropped = self.dropped_count.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped % 100 == 1 {
                    warn!(
                        total_dropped = dropped,
                        "Telemetry events being dropped due to channel overflow"
                    );
                }
            }
        }
    }

    /// Wait until every event queued before this call has been written.
    ///
    /// Returns immediately for a no-op logger.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.sender.send(WriterMsg::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn telemetry_writer_task(
    mut receiver: mpsc::Receiver<WriterMsg>,
    mut file: tokio::fs::File,
    path: PathBuf,
) {
    while let Some(msg) = receiver.recv().await {
        match msg {
            WriterMsg::Record(record) => match serde_json::to_string(&record) {
                Ok(json) => {
                    let line = format!("{}\n", json);
                    if let Err(e) = file.write_all(line.as_bytes()).await {
                        error!(path = %path.display(), error = %e, "Failed to write telemetry log");
                        continue;
                    }
                    if let Err(e) = file.flush().await {
                        error!(path = %path.display(), error = %e, "Failed to flush telemetry log");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to serialize telemetry event");
                }
            },
            WriterMsg::Flush(ack) => {
                let _ = file.flush().await;
                let _ = ack.send(());
            }
        }
    }
}

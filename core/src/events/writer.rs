use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::types::ProgressEvent;
use crate::config::EventsConfig;

/// Bounded, non-blocking progress event sender. Publishing never stalls
/// the execution loop; when the queue is full the newest event is dropped
/// and counted.
#[derive(Clone)]
pub struct EventTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl EventTx {
    /// Build a sender plus the raw line receiver. Used by the writer task
    /// below and directly by tests and embedding callers that want their
    /// own sink.
    pub fn channel(capacity: usize, drop_when_full: bool) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
                drop_when_full,
            },
            rx,
        )
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Publish one event. Returns false when the event was dropped (full
    /// queue or closed sink) or could not be serialized.
    pub async fn publish(&self, event: &ProgressEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(line) => self.send_line(line).await,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize progress event");
                false
            }
        }
    }

    pub async fn send_line(&self, line: String) -> bool {
        if self.drop_when_full {
            if self.tx.try_send(line).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            true
        } else {
            self.tx.send(line).await.is_ok()
        }
    }
}

/// Spawn the writer task draining the event queue to "stdout:" or an
/// append-only JSONL file. Returns None when events are disabled. A file
/// that cannot be opened disables events with a warning instead of
/// failing the task.
pub fn start_event_writer(cfg: &EventsConfig) -> Option<EventTx> {
    if !cfg.enabled || cfg.path.trim().is_empty() {
        return None;
    }

    let (tx, mut rx) = EventTx::channel(cfg.channel_capacity, cfg.drop_when_full);
    let path = cfg.path.clone();

    tokio::spawn(async move {
        let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = if path == "stdout:" {
            Box::new(tokio::io::stdout())
        } else {
            let file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(err) => {
                    tracing::warn!(%err, path, "cannot open events file, events disabled");
                    return;
                }
            };
            Box::new(file)
        };

        while let Some(mut line) = rx.recv().await {
            if !line.ends_with('\n') {
                line.push('\n');
            }
            if writer.write_all(line.as_bytes()).await.is_err() {
                return;
            }
        }

        let _ = writer.flush().await;
    });

    Some(tx)
}

// Push sender: forwards the buffered snapshot to the ingestion import endpoint on a fixed interval.

use crate::buffer::SnapshotBuffer;
use crate::error::ExporterError;
use crate::stats::ExporterStats;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tokio::time::{Duration, Instant, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

pub const IMPORT_PATH: &str = "/api/v1/import/prometheus";

pub struct PushSender {
    http: reqwest::Client,
    import_url: String,
}

impl PushSender {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExporterError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            import_url: format!("{}{}", base_url.trim_end_matches('/'), IMPORT_PATH),
        })
    }

    /// POSTs `data` as-is. Anything but 204 is a push error.
    #[instrument(skip(self, data), fields(operation = "push", bytes = data.len()))]
    pub async fn send(&self, data: Bytes) -> Result<(), ExporterError> {
        let resp = self
            .http
            .post(&self.import_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(data)
            .send()
            .await?;
        if resp.status() != StatusCode::NO_CONTENT {
            return Err(ExporterError::Push {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Pushes the current buffer contents. Returns `Ok(false)` without a request when the buffer
/// is empty. The buffer is left untouched either way.
pub async fn push_once(
    sender: &PushSender,
    buffer: &SnapshotBuffer,
    stats: &ExporterStats,
) -> Result<bool, ExporterError> {
    let data = buffer.read_snapshot();
    if data.is_empty() {
        return Ok(false);
    }
    let started = Instant::now();
    let result = sender.send(data).await;
    stats.record_push(result.is_ok(), started.elapsed());
    result.map(|()| true)
}

pub struct SenderDeps {
    pub sender: PushSender,
    pub buffer: Arc<SnapshotBuffer>,
    pub stats: Arc<ExporterStats>,
    pub cancel: CancellationToken,
}

pub struct SenderConfig {
    pub interval: Duration,
}

/// The first tick fires immediately, so a push is attempted at startup (a no-op while empty).
pub fn spawn(deps: SenderDeps, config: SenderConfig) -> tokio::task::JoinHandle<()> {
    let SenderDeps {
        sender,
        buffer,
        stats,
        cancel,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(config.interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = push_once(&sender, &buffer, &stats) => {
                            match result {
                                Ok(true) => debug!(operation = "push", "metrics pushed"),
                                Ok(false) => debug!(operation = "push", "buffer empty; nothing to push"),
                                Err(e) => error!(
                                    error = %e,
                                    operation = "push",
                                    "cannot write metrics to remote storage"
                                ),
                            }
                        }
                    }
                }
            }
        }
        info!("stopped metrics sender");
    })
}

// Inventory scraper: one cycle = list site ids -> bounded fan-out of detail fetches -> encode -> publish.
// Cycles run on a fixed interval and never overlap; a failed cycle is logged and retried next tick.

use crate::buffer::SnapshotBuffer;
use crate::config::ScrapeMode;
use crate::encoder::Snapshot;
use crate::error::ExporterError;
use crate::inventory_repo::InventoryClient;
use crate::stats::ExporterStats;
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tokio::time::{Duration, Instant, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Client, buffer, stats and cancellation for the scraper loop.
pub struct ScraperDeps {
    pub client: Arc<InventoryClient>,
    pub buffer: Arc<SnapshotBuffer>,
    pub stats: Arc<ExporterStats>,
    pub cancel: CancellationToken,
}

pub struct ScraperConfig {
    pub interval: Duration,
    pub concurrency: usize,
    pub mode: ScrapeMode,
    /// How often to log exporter stats (real time, independent of the scrape interval).
    pub stats_log_interval: Duration,
}

/// Encoded cycle output plus the number of site ids dropped on fetch/parse errors.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub snapshot: Snapshot,
    pub failed: usize,
}

/// Lists ids, then fetches details with at most `concurrency` requests in flight.
/// Returns once every fetch finished; failed ids are logged and left out.
pub async fn scrape_with_limit(
    client: &InventoryClient,
    concurrency: usize,
    timestamp_ms: i64,
) -> Result<ScrapeOutcome, ExporterError> {
    let ids = client.list_ids().await?;
    let results: Vec<_> = stream::iter(ids)
        .map(|id| async move { (id, client.fetch_detail(id).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut details = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (id, result) in results {
        match result {
            Ok(Some(detail)) => details.push(detail),
            Ok(None) => debug!(site_id = id, "inventory has no detail for site"),
            Err(e) => {
                warn!(
                    error = %e,
                    site_id = id,
                    operation = "fetch_detail",
                    "cannot fetch site detail; dropping site from this cycle"
                );
                failed += 1;
            }
        }
    }
    Ok(ScrapeOutcome {
        snapshot: Snapshot::from_details(&details, timestamp_ms),
        failed,
    })
}

/// Single-request variant using the "all details" endpoint.
pub async fn scrape_bulk(
    client: &InventoryClient,
    timestamp_ms: i64,
) -> Result<ScrapeOutcome, ExporterError> {
    let details = client.fetch_all_details().await?;
    Ok(ScrapeOutcome {
        snapshot: Snapshot::from_details(&details, timestamp_ms),
        failed: 0,
    })
}

/// Runs one cycle and publishes its snapshot when non-empty. Returns the number of lines produced.
pub async fn run_cycle(
    client: &InventoryClient,
    buffer: &SnapshotBuffer,
    stats: &ExporterStats,
    mode: ScrapeMode,
    concurrency: usize,
) -> Result<usize, ExporterError> {
    let started = Instant::now();
    let timestamp_ms = chrono::Utc::now().timestamp_millis();
    let outcome = match mode {
        ScrapeMode::PerSite => scrape_with_limit(client, concurrency, timestamp_ms).await,
        ScrapeMode::Bulk => scrape_bulk(client, timestamp_ms).await,
    };
    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            stats.record_scrape_failure(started.elapsed());
            return Err(e);
        }
    };
    stats.record_scrape(outcome.snapshot.len(), outcome.failed, started.elapsed());
    if !outcome.snapshot.is_empty() {
        buffer.publish(&outcome.snapshot);
    }
    Ok(outcome.snapshot.len())
}

pub fn spawn(deps: ScraperDeps, config: ScraperConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(deps, config))
}

#[instrument(name = "scraper", skip_all, fields(interval_secs = config.interval.as_secs(), concurrency = config.concurrency))]
async fn run(deps: ScraperDeps, config: ScraperConfig) {
    let ScraperDeps {
        client,
        buffer,
        stats,
        cancel,
    } = deps;
    let ScraperConfig {
        interval: scrape_interval,
        concurrency,
        mode,
        stats_log_interval,
    } = config;

    let mut tick = interval(scrape_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(stats_log_interval);
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = run_cycle(&client, &buffer, &stats, mode, concurrency) => {
                        match result {
                            Ok(lines) => debug!(operation = "scrape", lines, "scrape cycle finished"),
                            Err(e) => error!(
                                error = %e,
                                operation = "scrape",
                                "cannot scrape data from inventory api"
                            ),
                        }
                    }
                }
            }
            _ = stats_log_tick.tick() => {
                let s = stats.snapshot();
                info!(
                    scrapes_total = s.scrapes_total,
                    scrape_failures_total = s.scrape_failures_total,
                    sites_scraped_total = s.sites_scraped_total,
                    site_fetch_failures_total = s.site_fetch_failures_total,
                    pushes_total = s.pushes_total,
                    push_failures_total = s.push_failures_total,
                    scrape_duration_seconds_sum = s.scrape_duration_seconds_sum,
                    push_duration_seconds_sum = s.push_duration_seconds_sum,
                    "exporter stats"
                );
            }
        }
    }
    info!("stopped inventory scraper");
}

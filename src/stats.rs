// Exporter self-metrics in a prometheus registry (served on /metrics, logged by the scraper loop)

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};
use std::time::Duration;

pub struct ExporterStats {
    registry: Registry,
    scraped_targets: IntCounter,
    scrape_duration: Histogram,
    scrapes_total: IntCounter,
    scrape_failures_total: IntCounter,
    site_fetch_failures_total: IntCounter,
    push_duration: Histogram,
    pushes_total: IntCounter,
    push_failures_total: IntCounter,
}

/// Point-in-time counter values for the periodic stats log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub scrapes_total: u64,
    pub scrape_failures_total: u64,
    pub sites_scraped_total: u64,
    pub site_fetch_failures_total: u64,
    pub pushes_total: u64,
    pub push_failures_total: u64,
    pub scrape_duration_seconds_sum: f64,
    pub push_duration_seconds_sum: f64,
}

impl ExporterStats {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let scraped_targets = IntCounter::with_opts(Opts::new(
            "cybera_exporter_scrapped_targets",
            "Site details encoded across all scrape cycles",
        ))?;
        let scrape_duration = Histogram::with_opts(HistogramOpts::new(
            "cybera_exporter_scrape_duration_seconds",
            "Duration of scrape cycles, failed ones included",
        ))?;
        let scrapes_total = IntCounter::with_opts(Opts::new(
            "cybera_exporter_scrapes_total",
            "Scrape cycles started",
        ))?;
        let scrape_failures_total = IntCounter::with_opts(Opts::new(
            "cybera_exporter_scrape_failures_total",
            "Scrape cycles aborted before producing a snapshot",
        ))?;
        let site_fetch_failures_total = IntCounter::with_opts(Opts::new(
            "cybera_exporter_site_fetch_failures_total",
            "Site ids dropped because their detail could not be fetched or parsed",
        ))?;
        let push_duration = Histogram::with_opts(HistogramOpts::new(
            "cybera_exporter_push_request_duration_seconds",
            "Duration of push requests to the ingestion endpoint",
        ))?;
        let pushes_total = IntCounter::with_opts(Opts::new(
            "cybera_exporter_pushes_total",
            "Push requests sent to the ingestion endpoint",
        ))?;
        let push_failures_total = IntCounter::with_opts(Opts::new(
            "cybera_exporter_push_failures_total",
            "Push requests that did not answer 204",
        ))?;

        registry.register(Box::new(scraped_targets.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(scrape_failures_total.clone()))?;
        registry.register(Box::new(site_fetch_failures_total.clone()))?;
        registry.register(Box::new(push_duration.clone()))?;
        registry.register(Box::new(pushes_total.clone()))?;
        registry.register(Box::new(push_failures_total.clone()))?;

        Ok(Self {
            registry,
            scraped_targets,
            scrape_duration,
            scrapes_total,
            scrape_failures_total,
            site_fetch_failures_total,
            push_duration,
            pushes_total,
            push_failures_total,
        })
    }

    /// Completed cycle: `sites` encoded, `failed` ids dropped.
    pub fn record_scrape(&self, sites: usize, failed: usize, elapsed: Duration) {
        self.scrapes_total.inc();
        self.scraped_targets.inc_by(sites as u64);
        self.site_fetch_failures_total.inc_by(failed as u64);
        self.scrape_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_scrape_failure(&self, elapsed: Duration) {
        self.scrapes_total.inc();
        self.scrape_failures_total.inc();
        self.scrape_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_push(&self, ok: bool, elapsed: Duration) {
        self.pushes_total.inc();
        if !ok {
            self.push_failures_total.inc();
        }
        self.push_duration.observe(elapsed.as_secs_f64());
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            scrapes_total: self.scrapes_total.get(),
            scrape_failures_total: self.scrape_failures_total.get(),
            sites_scraped_total: self.scraped_targets.get(),
            site_fetch_failures_total: self.site_fetch_failures_total.get(),
            pushes_total: self.pushes_total.get(),
            push_failures_total: self.push_failures_total.get(),
            scrape_duration_seconds_sum: self.scrape_duration.get_sample_sum(),
            push_duration_seconds_sum: self.push_duration.get_sample_sum(),
        }
    }

    /// Registry contents in the Prometheus text exposition format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

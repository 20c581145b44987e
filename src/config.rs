use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub inventory: InventoryConfig,
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_port() -> u16 {
    8436
}

fn default_host() -> String {
    "0.0.0.0".into()
}

/// How a scrape cycle gathers site details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeMode {
    /// List ids, then fetch each detail with bounded concurrency.
    #[default]
    PerSite,
    /// Fetch every detail from the single "all details" endpoint.
    Bulk,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Base URL of the inventory API, e.g. https://inventory.example.net
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_scrape_interval_secs")]
    pub scrape_interval_secs: u64,
    /// Max detail requests in flight during one scrape cycle.
    #[serde(default = "default_scrape_concurrency")]
    pub scrape_concurrency: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub scrape_mode: ScrapeMode,
}

fn default_scrape_interval_secs() -> u64 {
    20
}

fn default_scrape_concurrency() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Base URL of the ingestion endpoint, e.g. http://localhost:8428
    pub url: String,
    #[serde(default = "default_push_interval_secs")]
    pub push_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_push_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log exporter stats at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl InventoryConfig {
    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl IngestionConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.inventory.url.is_empty(),
            "inventory.url must be non-empty, e.g. https://inventory.example.net"
        );
        anyhow::ensure!(
            !self.inventory.username.is_empty(),
            "inventory.username must be non-empty"
        );
        anyhow::ensure!(
            !self.inventory.password.is_empty(),
            "inventory.password must be non-empty"
        );
        anyhow::ensure!(
            self.inventory.scrape_interval_secs > 0,
            "inventory.scrape_interval_secs must be > 0, got {}",
            self.inventory.scrape_interval_secs
        );
        anyhow::ensure!(
            self.inventory.scrape_concurrency > 0,
            "inventory.scrape_concurrency must be > 0, got {}",
            self.inventory.scrape_concurrency
        );
        anyhow::ensure!(
            self.inventory.request_timeout_secs > 0,
            "inventory.request_timeout_secs must be > 0, got {}",
            self.inventory.request_timeout_secs
        );
        anyhow::ensure!(
            !self.ingestion.url.is_empty(),
            "ingestion.url must be non-empty, e.g. http://localhost:8428"
        );
        anyhow::ensure!(
            self.ingestion.push_interval_secs > 0,
            "ingestion.push_interval_secs must be > 0, got {}",
            self.ingestion.push_interval_secs
        );
        anyhow::ensure!(
            self.ingestion.request_timeout_secs > 0,
            "ingestion.request_timeout_secs must be > 0, got {}",
            self.ingestion.request_timeout_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}

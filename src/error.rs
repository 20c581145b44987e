// Error taxonomy for the scrape/push pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    /// Missing or invalid startup configuration.
    #[error("config: {0}")]
    Config(String),
    /// Token exchange or token parsing failed.
    #[error("auth: {0}")]
    Auth(String),
    /// Inventory API answered 403; the cached token is invalid or expired.
    #[error("invalid or expired auth token")]
    Authorization,
    #[error("unexpected api response status code: {status}, api resp: {body}")]
    Request { status: u16, body: String },
    #[error("cannot parse api response: {0}")]
    Parse(String),
    #[error("unexpected status code from ingestion endpoint: {status}")]
    Push { status: u16 },
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

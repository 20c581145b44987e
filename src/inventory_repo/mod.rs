// Inventory API client: authenticated reads of site ids and site details.

mod token;

pub use token::{AUTH_PATH, EXPIRY_MARGIN_SECS, TokenManager, expiry_from_jwt};

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::ExporterError;
use crate::models::{Credential, SiteDetail, SiteRef};

pub const SITE_IDS_PATH: &str = "/api/vip/site/status/simple/all";
pub const SITE_DETAIL_PATH: &str = "/api/vip/site/detail";
pub const SITE_DETAIL_ALL_PATH: &str = "/api/vip/site/detail/all";

pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
}

impl InventoryClient {
    pub fn new(
        base_url: &str,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self, ExporterError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            tokens: TokenManager::new(http.clone(), &base_url, credential),
            http,
            base_url,
        })
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Ids of all known sites. A 403 invalidates the cached token before the error is returned.
    #[instrument(skip(self), fields(repo = "inventory", operation = "list_ids"))]
    pub async fn list_ids(&self) -> Result<Vec<i64>, ExporterError> {
        let Some(body) = self.request_or_invalidate(SITE_IDS_PATH).await? else {
            return Ok(Vec::new());
        };
        let refs: Vec<SiteRef> = serde_json::from_slice(&body)
            .map_err(|e| ExporterError::Parse(format!("site ids: {e}")))?;
        debug!(sites_count = refs.len(), "site ids listed");
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    /// Detail record for one site; `None` when the inventory has no data for it (404).
    #[instrument(skip(self), fields(repo = "inventory", operation = "fetch_detail"))]
    pub async fn fetch_detail(&self, id: i64) -> Result<Option<SiteDetail>, ExporterError> {
        let path = format!("{SITE_DETAIL_PATH}/{id}");
        let Some(body) = self.request(&path).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ExporterError::Parse(format!("site {id}: {e}")))
    }

    /// All site details in one call (bulk scrape mode).
    #[instrument(skip(self), fields(repo = "inventory", operation = "fetch_all_details"))]
    pub async fn fetch_all_details(&self) -> Result<Vec<SiteDetail>, ExporterError> {
        let Some(body) = self.request_or_invalidate(SITE_DETAIL_ALL_PATH).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(&body)
            .map_err(|e| ExporterError::Parse(format!("site details: {e}")))
    }

    async fn request_or_invalidate(&self, path: &str) -> Result<Option<Bytes>, ExporterError> {
        match self.request(path).await {
            Err(ExporterError::Authorization) => {
                self.tokens.invalidate().await;
                Err(ExporterError::Authorization)
            }
            other => other,
        }
    }

    /// GET with the bearer token attached. 404 maps to `Ok(None)`, 403 to `Authorization`.
    async fn request(&self, path: &str) -> Result<Option<Bytes>, ExporterError> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        match status {
            StatusCode::OK => Ok(Some(body)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::FORBIDDEN => Err(ExporterError::Authorization),
            _ => Err(ExporterError::Request {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

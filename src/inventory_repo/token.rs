// Bearer token lifecycle: exchange credentials, cache the token until shortly before `exp`.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::ExporterError;
use crate::models::{AuthToken, Credential, JwtClaims};

pub const AUTH_PATH: &str = "/api/vip/token";

/// Tokens expiring within this many seconds are refreshed before use.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

const CLAIMS_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const CLAIMS_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, CLAIMS_CONFIG);
const CLAIMS_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, CLAIMS_CONFIG);

/// Owns the cached bearer token. The lock is held across a refresh so concurrent
/// callers wait for the one in-flight exchange instead of starting their own.
pub struct TokenManager {
    http: reqwest::Client,
    auth_url: String,
    credential: Credential,
    state: Mutex<Option<AuthToken>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, base_url: &str, credential: Credential) -> Self {
        Self {
            http,
            auth_url: format!("{}{}", base_url.trim_end_matches('/'), AUTH_PATH),
            credential,
            state: Mutex::new(None),
        }
    }

    /// Returns the cached token, refreshing it first when it is missing or about to expire.
    pub async fn get_token(&self) -> Result<String, ExporterError> {
        let mut state = self.state.lock().await;
        let margin = chrono::Duration::seconds(EXPIRY_MARGIN_SECS);
        if let Some(cached) = state.as_ref()
            && cached.is_usable(Utc::now(), margin)
        {
            return Ok(cached.token.clone());
        }
        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *state = Some(fresh);
        Ok(token)
    }

    /// Drops the cached token; the next `get_token` performs a new exchange.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
        debug!("auth token invalidated");
    }

    #[instrument(skip(self), fields(repo = "inventory", operation = "token_exchange", username = self.credential.username()))]
    async fn exchange(&self) -> Result<AuthToken, ExporterError> {
        let resp = self
            .http
            .post(&self.auth_url)
            .json(&self.credential)
            .send()
            .await
            .map_err(|e| ExporterError::Auth(format!("cannot query auth api endpoint: {e}")))?;
        if resp.status() != StatusCode::OK {
            return Err(ExporterError::Auth(format!(
                "unexpected auth api response status code: {}",
                resp.status().as_u16()
            )));
        }
        let token = resp
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExporterError::Auth("auth api response carries no token".into()))?
            .to_string();
        let expires_at = expiry_from_jwt(&token)?;
        debug!(%expires_at, "auth token refreshed");
        Ok(AuthToken { token, expires_at })
    }
}

/// Reads the `exp` claim from the middle segment of a `header.claims.signature` token.
pub fn expiry_from_jwt(token: &str) -> Result<DateTime<Utc>, ExporterError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ExporterError::Auth(format!(
            "bad jwt token format, expected 3 dot delimited parts, got: {}",
            parts.len()
        )));
    }
    let raw = CLAIMS_STANDARD
        .decode(parts[1])
        .or_else(|_| CLAIMS_URL_SAFE.decode(parts[1]))
        .map_err(|e| ExporterError::Auth(format!("cannot base64 decode jwt claims: {e}")))?;
    let claims: JwtClaims = serde_json::from_slice(&raw)
        .map_err(|e| ExporterError::Auth(format!("cannot parse jwt claims: {e}")))?;
    DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| ExporterError::Auth(format!("jwt exp out of range: {}", claims.exp)))
}

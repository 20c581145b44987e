// Inventory API credentials and bearer token state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExporterError;

/// Username/password pair posted to the token endpoint.
#[derive(Clone, Serialize)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    pub fn new(username: &str, password: &str) -> Result<Self, ExporterError> {
        if username.is_empty() {
            return Err(ExporterError::Config(
                "inventory api username cannot be empty".into(),
            ));
        }
        if password.is_empty() {
            return Err(ExporterError::Config(
                "inventory api password cannot be empty".into(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cached bearer token with the expiry taken from its `exp` claim.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// True when the token stays valid for more than `margin` after `now`.
    pub fn is_usable(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        !self.token.is_empty() && self.expires_at - now > margin
    }
}

/// Supported JWT claims.
#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub exp: i64,
}

// Shared test helpers: fake tokens, site payloads, mock inventory auth

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use site_exporter::inventory_repo::{AUTH_PATH, InventoryClient};
use site_exporter::models::{Credential, PhysicalAddress, SiteDetail};
use std::time::Duration;

/// `header.claims.signature` token whose claims carry `exp`.
pub fn jwt_with_exp(exp: i64) -> String {
    let claims = STANDARD_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("eyJhbGciOiJIUzI1NiJ9.{claims}.sig")
}

/// Token valid for an hour from now.
pub fn fresh_jwt() -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() + 3600)
}

pub fn site(name: &str, status: &str) -> SiteDetail {
    SiteDetail {
        name: name.into(),
        status: status.into(),
        physical_address: PhysicalAddress {
            city: "Berlin".into(),
            country: "DE".into(),
            state: "BE".into(),
            lat: 52.52,
            lng: 13.405,
        },
    }
}

pub fn site_json(name: &str, status: &str) -> String {
    serde_json::to_string(&site(name, status)).unwrap()
}

pub fn client_for(url: &str) -> InventoryClient {
    let cred = Credential::new("exporter", "secret").unwrap();
    InventoryClient::new(url, cred, Duration::from_secs(5)).unwrap()
}

/// Auth endpoint answering with `token` in the Authorization header, expected `hits` times.
pub async fn mock_auth(server: &mut mockito::ServerGuard, token: &str, hits: usize) -> mockito::Mock {
    server
        .mock("POST", AUTH_PATH)
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "username": "exporter",
            "password": "secret",
        })))
        .with_status(200)
        .with_header("authorization", token)
        .expect(hits)
        .create_async()
        .await
}

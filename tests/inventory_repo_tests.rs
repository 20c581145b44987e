// InventoryClient + TokenManager against a mock inventory API

mod common;

use common::{client_for, fresh_jwt, jwt_with_exp, mock_auth, site_json};
use site_exporter::error::ExporterError;
use site_exporter::inventory_repo::{SITE_DETAIL_ALL_PATH, SITE_IDS_PATH};
use std::sync::Arc;

#[tokio::test]
async fn token_is_reused_within_expiry_margin() {
    let mut server = mockito::Server::new_async().await;
    let token = "H.eyJleHAiOjk5OTk5OTk5OTl9.S";
    let auth = mock_auth(&mut server, token, 1).await;

    let client = client_for(&server.url());
    let first = client.token_manager().get_token().await.unwrap();
    let second = client.token_manager().get_token().await.unwrap();
    assert_eq!(first, token);
    assert_eq!(second, token);
    auth.assert_async().await;
}

#[tokio::test]
async fn token_close_to_expiry_is_refreshed_each_call() {
    let mut server = mockito::Server::new_async().await;
    let token = jwt_with_exp(chrono::Utc::now().timestamp() + 5);
    let auth = mock_auth(&mut server, &token, 2).await;

    let client = client_for(&server.url());
    client.token_manager().get_token().await.unwrap();
    client.token_manager().get_token().await.unwrap();
    auth.assert_async().await;
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let mut server = mockito::Server::new_async().await;
    let auth = mock_auth(&mut server, &fresh_jwt(), 1).await;

    let client = Arc::new(client_for(&server.url()));
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = client.clone();
        tasks.spawn(async move { client.token_manager().get_token().await });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().is_ok());
    }
    auth.assert_async().await;
}

#[tokio::test]
async fn bearer_prefix_in_auth_header_is_stripped() {
    let mut server = mockito::Server::new_async().await;
    let token = fresh_jwt();
    let _auth = mock_auth(&mut server, &format!("Bearer {token}"), 1).await;

    let client = client_for(&server.url());
    assert_eq!(client.token_manager().get_token().await.unwrap(), token);
}

#[tokio::test]
async fn auth_failure_status_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/vip/token")
        .with_status(401)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.list_ids().await.unwrap_err();
    assert!(matches!(err, ExporterError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn auth_response_without_token_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _auth = server
        .mock("POST", "/api/vip/token")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.token_manager().get_token().await.unwrap_err();
    assert!(err.to_string().contains("no token"));
}

#[tokio::test]
async fn malformed_token_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, "not-a-jwt", 1).await;

    let client = client_for(&server.url());
    let err = client.token_manager().get_token().await.unwrap_err();
    assert!(matches!(err, ExporterError::Auth(_)));
}

#[tokio::test]
async fn list_ids_sends_bearer_token_and_parses_ids() {
    let mut server = mockito::Server::new_async().await;
    let token = fresh_jwt();
    let _auth = mock_auth(&mut server, &token, 1).await;
    let list = server
        .mock("GET", SITE_IDS_PATH)
        .match_header("authorization", format!("Bearer {token}").as_str())
        .with_status(200)
        .with_body(r#"[{"id":1,"status":"ONLINE"},{"id":42,"status":"OFFLINE"}]"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert_eq!(client.list_ids().await.unwrap(), vec![1, 42]);
    list.assert_async().await;
}

#[tokio::test]
async fn list_ids_forbidden_invalidates_token() {
    let mut server = mockito::Server::new_async().await;
    let auth = mock_auth(&mut server, &fresh_jwt(), 2).await;
    let _list = server
        .mock("GET", SITE_IDS_PATH)
        .with_status(403)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.list_ids().await.unwrap_err();
    assert!(matches!(err, ExporterError::Authorization));
    // The cached token was dropped, so the next call exchanges credentials again.
    let err = client.list_ids().await.unwrap_err();
    assert!(matches!(err, ExporterError::Authorization));
    auth.assert_async().await;
}

#[tokio::test]
async fn detail_not_found_is_no_data() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let _detail = server
        .mock("GET", "/api/vip/site/detail/7")
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert!(client.fetch_detail(7).await.unwrap().is_none());
}

#[tokio::test]
async fn detail_server_error_carries_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let _detail = server
        .mock("GET", "/api/vip/site/detail/9")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server.url());
    match client.fetch_detail(9).await.unwrap_err() {
        ExporterError::Request { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn detail_is_parsed_and_unknown_fields_ignored() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let _detail = server
        .mock("GET", "/api/vip/site/detail/3")
        .with_status(200)
        .with_body(
            r#"{"name":"branch","status":"ONBACKUP","phoneNumber":"555",
                "physicalAddress":{"id":12,"city":"Oslo","country":"NO","state":"",
                "lat":59.91,"lng":10.75}}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server.url());
    let detail = client.fetch_detail(3).await.unwrap().unwrap();
    assert_eq!(detail.name, "branch");
    assert_eq!(detail.site_status().id(), 3);
    assert_eq!(detail.physical_address.city, "Oslo");
    assert_eq!(detail.physical_address.lng, 10.75);
}

#[tokio::test]
async fn malformed_detail_is_parse_error() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let _detail = server
        .mock("GET", "/api/vip/site/detail/4")
        .with_status(200)
        .with_body("{not json")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.fetch_detail(4).await.unwrap_err();
    assert!(matches!(err, ExporterError::Parse(_)));
}

#[tokio::test]
async fn fetch_all_details_parses_array() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let body = format!("[{},{}]", site_json("a", "ONLINE"), site_json("b", "PENDING"));
    let _all = server
        .mock("GET", SITE_DETAIL_ALL_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let details = client.fetch_all_details().await.unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[1].status, "PENDING");
}

#[tokio::test]
async fn detail_with_null_fields_uses_zero_values() {
    let mut server = mockito::Server::new_async().await;
    let _auth = mock_auth(&mut server, &fresh_jwt(), 1).await;
    let _partial = server
        .mock("GET", "/api/vip/site/detail/11")
        .with_status(200)
        .with_body(
            r#"{"name":"kiosk","status":null,
                "physicalAddress":{"city":"Turku","country":null,"state":null,"lat":null,"lng":22.27}}"#,
        )
        .create_async()
        .await;
    let _no_address = server
        .mock("GET", "/api/vip/site/detail/12")
        .with_status(200)
        .with_body(r#"{"name":null,"status":"ONLINE","physicalAddress":null}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let partial = client.fetch_detail(11).await.unwrap().unwrap();
    assert_eq!(partial.name, "kiosk");
    assert_eq!(partial.status, "");
    assert_eq!(partial.physical_address.city, "Turku");
    assert_eq!(partial.physical_address.country, "");
    assert_eq!(partial.physical_address.state, "");
    assert_eq!(partial.physical_address.lat, 0.0);
    assert_eq!(partial.physical_address.lng, 22.27);

    let no_address = client.fetch_detail(12).await.unwrap().unwrap();
    assert_eq!(no_address.name, "");
    assert_eq!(no_address.status, "ONLINE");
    assert_eq!(no_address.physical_address, Default::default());
}
